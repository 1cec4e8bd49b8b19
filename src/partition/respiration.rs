//! Ecosystem respiration: temperature sensitivity, daily reference rate, and
//! the continuous respiration model.
//!
//! Purpose
//! -------
//! Turn valid night-time NEE into a respiration model `TER(T, day)` that can
//! be evaluated at every timestamp. Three stages, each consuming the owned
//! output of the previous one:
//!
//! 1. [`estimate_e0`]: joint Lloyd–Taylor fits in fixed windows centred on
//!    every day with night data; the accepted E0 values are aggregated by the
//!    median into one global, immutable [`TemperatureSensitivity`].
//! 2. [`estimate_r10`]: for every calendar day, R10 alone is fitted with E0
//!    fixed, widening the window along the configured schedule until a fit is
//!    accepted.
//! 3. [`RespirationModel`]: E0 plus the gap-filled daily R10 series.
//!
//! Key behaviors
//! -------------
//! - Windows and days are independent and fitted in parallel with `rayon`;
//!   results are collected in day order so output is deterministic.
//! - Per-window and per-day failures are recorded as
//!   [`RejectionReason`]s. The only fatal outcome is a temperature-sensitivity
//!   stage with zero accepted windows.
//! - Starting values come from data (log-linear regression for the joint fit,
//!   a closed-form scale for R10) and fall back to configured guesses.
//!
//! Invariants & assumptions
//! ------------------------
//! - Only valid night observations enter any fit.
//! - The model is undefined at or below `T0`; such evaluations return
//!   [`RejectionReason::PhysicalConstraintViolation`] instead of a value.
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    optimization::least_squares::FitOptions,
    partition::{
        data::{Observation, ObservationSeries},
        errors::{PartitionError, PartitionResult, RejectionCounts, RejectionReason},
        fit::{fit_window, FitOutcome, FitPoint, ParamSpec},
        interpolation::{fill_gaps, FilledValue, Provenance},
        models::{arrhenius_term, lloyd_taylor, LloydTaylor, T0},
        options::{RespirationRateOptions, TemperatureSensitivityOptions},
        window::{day_span, fit_adaptive, AdaptiveOutcome, DailyEstimate},
    },
    utils::{linear_regression, median, sample_std_dev},
};

/// Outcome of the joint fit in the window centred on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowFit {
    pub day: NaiveDate,
    pub day_index: usize,
    pub outcome: FitOutcome,
}

/// Global temperature sensitivity.
///
/// `e0` is the median of the accepted window estimates; `std_dev` is their
/// sample standard deviation (`None` with a single accepted window).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureSensitivity {
    pub e0: f64,
    pub std_dev: Option<f64>,
    pub accepted: usize,
    pub windows: Vec<WindowFit>,
}

impl TemperatureSensitivity {
    pub fn rejection_counts(&self) -> RejectionCounts {
        RejectionCounts::tally(self.windows.iter().filter_map(|w| w.outcome.rejection()))
    }
}

/// Estimate the global temperature sensitivity E0.
///
/// Every day with at least one valid night observation centres a window of
/// `opts.window_days`. A window is rejected, in order, for too few points, a
/// night temperature span below `opts.min_temperature_range`, or any
/// acceptance failure of [`fit_window`].
///
/// # Errors
/// - [`PartitionError::TemperatureSensitivityUnavailable`] when no window is
///   accepted, with the per-reason counts.
pub fn estimate_e0(
    series: &ObservationSeries, opts: &TemperatureSensitivityOptions, fit_opts: &FitOptions,
) -> PartitionResult<TemperatureSensitivity> {
    let n_days = series.n_days();
    let centres: Vec<usize> =
        (0..n_days).filter(|&d| !series.night_indices(d).is_empty()).collect();

    let windows: Vec<WindowFit> = centres
        .par_iter()
        .map(|&d| {
            let span = day_span(d, opts.window_days, n_days);
            let span_days = span.len();
            let points = series.night_points(span);
            let outcome = fit_sensitivity_window(&points, span_days, opts, fit_opts);
            if let Some(reason) = outcome.rejection() {
                debug!(day = %series.days()[d], %reason, "E0 window rejected");
            }
            WindowFit { day: series.days()[d], day_index: d, outcome }
        })
        .collect();

    let accepted: Vec<f64> =
        windows.iter().filter_map(|w| w.outcome.accepted().and_then(|f| f.value("E0"))).collect();
    let Some(e0) = median(&accepted) else {
        let counts = RejectionCounts::tally(windows.iter().filter_map(|w| w.outcome.rejection()));
        warn!(windows = windows.len(), %counts, "no temperature-sensitivity window accepted");
        return Err(PartitionError::TemperatureSensitivityUnavailable { windows: windows.len(), counts });
    };

    let std_dev = sample_std_dev(&accepted);
    info!(e0, ?std_dev, accepted = accepted.len(), windows = windows.len(), "temperature sensitivity estimated");
    Ok(TemperatureSensitivity { e0, std_dev, accepted: accepted.len(), windows })
}

fn fit_sensitivity_window(
    points: &[FitPoint], window_days: usize, opts: &TemperatureSensitivityOptions, fit_opts: &FitOptions,
) -> FitOutcome {
    let required = opts.acceptance.min_points;
    if points.len() < required {
        return FitOutcome::reject(
            RejectionReason::InsufficientData { available: points.len(), required },
            window_days,
            points.len(),
        );
    }

    let (lo, hi) = points
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.x), hi.max(p.x)));
    let range = hi - lo;
    if range < opts.min_temperature_range {
        return FitOutcome::reject(
            RejectionReason::NarrowTemperatureRange { range, required: opts.min_temperature_range },
            window_days,
            points.len(),
        );
    }

    let (e0_start, r10_start) = joint_start(points, opts);
    let specs = [
        ParamSpec { name: "E0", bounds: opts.e0_bounds, initial: e0_start },
        ParamSpec { name: "R10", bounds: opts.r10_bounds, initial: r10_start },
    ];
    fit_window(&LloydTaylor::joint(), &specs, points, window_days, &opts.acceptance, fit_opts)
}

/// `ln R = ln R10 + E0·g(T)` over positive NEE; configured guesses when the
/// regression is unusable or lands outside the bounds.
fn joint_start(points: &[FitPoint], opts: &TemperatureSensitivityOptions) -> (f64, f64) {
    let (g, ln_r): (Vec<f64>, Vec<f64>) = points
        .iter()
        .filter(|p| p.y > 0.0)
        .map(|p| (arrhenius_term(p.x), p.y.ln()))
        .unzip();
    match linear_regression(&g, &ln_r) {
        Some((intercept, slope)) => {
            let r10 = intercept.exp();
            if opts.e0_bounds.excludes(slope) || opts.r10_bounds.excludes(r10) {
                (opts.e0_guess, opts.r10_guess)
            } else {
                (slope, r10)
            }
        }
        None => (opts.e0_guess, opts.r10_guess),
    }
}

/// Estimate R10 for every calendar day with E0 held fixed.
///
/// Each day walks `opts.schedule`; the first accepted width wins. Never fails:
/// a day without an accepted width carries its terminal rejection.
pub fn estimate_r10(
    series: &ObservationSeries, e0: f64, opts: &RespirationRateOptions, fit_opts: &FitOptions,
) -> Vec<DailyEstimate> {
    let n_days = series.n_days();
    let model = LloydTaylor::with_fixed_e0(e0);

    let daily: Vec<DailyEstimate> = (0..n_days)
        .into_par_iter()
        .map(|d| {
            let outcome = fit_adaptive(&opts.schedule, |width| {
                let span = day_span(d, width, n_days);
                let span_days = span.len();
                let points = series.night_points(span);
                let specs = [ParamSpec {
                    name: "R10",
                    bounds: opts.r10_bounds,
                    initial: r10_start(&points, e0, opts),
                }];
                fit_window(&model, &specs, &points, span_days, &opts.acceptance, fit_opts)
            });
            if let Some(reason) = outcome.rejection() {
                debug!(day = %series.days()[d], %reason, "R10 day rejected");
            }
            DailyEstimate { day: series.days()[d], day_index: d, outcome }
        })
        .collect();

    let accepted = daily.iter().filter(|d| d.outcome.fit().is_some()).count();
    if accepted == 0 {
        warn!(days = n_days, "no daily R10 fit accepted");
    } else {
        info!(accepted, gaps = n_days - accepted, "daily R10 estimated");
    }
    daily
}

/// Closed-form least squares scale `Σ y·f / Σ f²` with `f = exp(E0·g(T))`.
fn r10_start(points: &[FitPoint], e0: f64, opts: &RespirationRateOptions) -> f64 {
    let (num, den) = points.iter().fold((0.0, 0.0), |(num, den), p| {
        let f = lloyd_taylor(p.x, e0, 1.0);
        (num + p.y * f, den + f * f)
    });
    let r10 = num / den;
    if r10.is_finite() && !opts.r10_bounds.excludes(r10) {
        r10
    } else {
        opts.r10_guess
    }
}

/// Continuous respiration model: global E0 and gap-filled daily R10.
#[derive(Debug, Clone, PartialEq)]
pub struct RespirationModel {
    e0: f64,
    filled: Option<Vec<FilledValue>>,
}

impl RespirationModel {
    /// Gap-fill `daily_r10` (one entry per calendar day, in order).
    pub fn new(e0: f64, daily_r10: &[DailyEstimate]) -> Self {
        Self { e0, filled: fill_gaps(daily_r10) }
    }

    pub fn e0(&self) -> f64 {
        self.e0
    }

    /// R10 in effect on `day_index` and where it came from.
    ///
    /// Indices past the last day use the last day's value.
    pub fn r10(&self, day_index: usize) -> Result<(f64, Provenance), RejectionReason> {
        let filled = self.filled.as_deref().ok_or(RejectionReason::NoAcceptedFits)?;
        let value = filled
            .get(day_index)
            .or_else(|| filled.last())
            .ok_or(RejectionReason::NoAcceptedFits)?;
        Ok((value.values[0], value.provenance))
    }

    /// `TER(T, day)` in µmol m⁻² s⁻¹.
    pub fn ter(&self, temperature: f64, day_index: usize) -> Result<f64, RejectionReason> {
        if !temperature.is_finite() {
            return Err(RejectionReason::MissingInput { field: "temperature" });
        }
        if temperature <= T0 {
            return Err(RejectionReason::PhysicalConstraintViolation { temperature });
        }
        let (r10, _) = self.r10(day_index)?;
        Ok(lloyd_taylor(temperature, self.e0, r10))
    }

    /// TER at an observation's own temperature and day.
    pub fn respiration_at(&self, obs: &Observation) -> Result<f64, RejectionReason> {
        let temperature = obs.temperature.ok_or(RejectionReason::MissingInput { field: "temperature" })?;
        self.ter(temperature, obs.day_index)
    }
}

/// Day-level rejection reason of an adaptive estimate, if any.
pub(crate) fn day_rejection(daily: &[DailyEstimate], day_index: usize) -> Option<RejectionReason> {
    match daily.get(day_index).map(|d| &d.outcome) {
        Some(AdaptiveOutcome::Rejected { reason, .. }) => Some(reason.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::{
        data::RawRecord,
        options::{PartitionOptions, QualityOptions},
        window::WindowSchedule,
    };
    use chrono::{Duration, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    // Hourly night-only records (PPFD = 0) with a deterministic temperature
    // cycle of ±6 K around 283 K and NEE = R(T) ± 0.05.
    fn night_records(n_days: usize, e0: f64, r10: f64) -> Vec<RawRecord> {
        (0..n_days * 24)
            .map(|h| {
                let t = 283.15 + 6.0 * ((h as f64) * 0.7).sin();
                let noise = if h % 2 == 0 { 0.05 } else { -0.05 };
                RawRecord {
                    timestamp: start() + Duration::hours(h as i64),
                    nee: Some(lloyd_taylor(t, e0, r10) + noise),
                    temperature: Some(t),
                    ppfd: Some(0.0),
                    qc_flag: None,
                }
            })
            .collect()
    }

    fn series(records: &[RawRecord]) -> ObservationSeries {
        ObservationSeries::from_records(records, &QualityOptions::default()).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // E0 is recovered from night data and aggregated over all windows.
    //
    // Given
    // -----
    // - 10 days of hourly night data from E0 = 120, R10 = 3.
    //
    // Expect
    // ------
    // - Every window accepted; median E0 within 10% of 120.
    fn estimate_e0_recovers_sensitivity() {
        let s = series(&night_records(10, 120.0, 3.0));
        let opts = PartitionOptions::default();

        let ts = estimate_e0(&s, &opts.temperature_sensitivity, &opts.optimizer).unwrap();

        assert_eq!(ts.windows.len(), 10);
        assert_eq!(ts.accepted, 10);
        assert!((ts.e0 - 120.0).abs() < 12.0, "E0 = {}", ts.e0);
        assert_eq!(ts.rejection_counts().total(), 0);
    }

    #[test]
    // Purpose
    // -------
    // Narrow temperature spans are rejected before fitting and the stage
    // fails fatally when nothing is accepted.
    fn estimate_e0_fails_on_isothermal_nights() {
        let records: Vec<RawRecord> = night_records(5, 100.0, 2.0)
            .into_iter()
            .map(|mut r| {
                r.temperature = Some(285.0);
                r
            })
            .collect();
        let opts = PartitionOptions::default();

        let err = estimate_e0(&series(&records), &opts.temperature_sensitivity, &opts.optimizer).unwrap_err();

        match err {
            PartitionError::TemperatureSensitivityUnavailable { windows, counts } => {
                assert_eq!(windows, 5);
                assert_eq!(counts.narrow_temperature_range, 5);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn estimate_r10_recovers_daily_rate() {
        let s = series(&night_records(6, 100.0, 2.0));
        let opts = PartitionOptions::default();

        let daily = estimate_r10(&s, 100.0, &opts.respiration_rate, &opts.optimizer);

        assert_eq!(daily.len(), 6);
        for d in &daily {
            let fit = d.outcome.fit().unwrap_or_else(|| panic!("day {} rejected", d.day));
            assert!((fit.value("R10").unwrap() - 2.0).abs() < 0.05);
        }
    }

    #[test]
    // Purpose
    // -------
    // Fits record the days a window actually covers, not the nominal width.
    //
    // Given
    // -----
    // - 6 days of night data; every day accepted at the first width (5).
    //
    // Expect
    // ------
    // - Edge days report the clipped span (3 and 4 days), interior days 5,
    //   and the fitted provenance carries the same span.
    fn window_days_reflect_edge_clipping() {
        let s = series(&night_records(6, 100.0, 2.0));
        let opts = PartitionOptions::default();

        let daily = estimate_r10(&s, 100.0, &opts.respiration_rate, &opts.optimizer);
        let model = RespirationModel::new(100.0, &daily);

        let spans: Vec<usize> = daily
            .iter()
            .map(|d| d.outcome.fit().unwrap_or_else(|| panic!("day {} rejected", d.day)).window_days)
            .collect();
        assert_eq!(spans, vec![3, 4, 5, 5, 4, 3]);
        assert_eq!(model.r10(0).unwrap().1, Provenance::Fitted { window_days: 3 });
    }

    #[test]
    // Purpose
    // -------
    // A day with no night data anywhere in reach is rejected, not fatal.
    fn estimate_r10_reports_insufficient_data() {
        let mut records = night_records(3, 100.0, 2.0);
        for r in records.iter_mut() {
            r.nee = None;
        }
        let opts = RespirationRateOptions { schedule: WindowSchedule::fixed(3), ..Default::default() };

        let daily = estimate_r10(&series(&records), 100.0, &opts, &FitOptions::default());

        assert!(daily.iter().all(|d| matches!(
            d.outcome.rejection(),
            Some(RejectionReason::InsufficientData { available: 0, .. })
        )));
        let model = RespirationModel::new(100.0, &daily);
        assert_eq!(model.ter(285.0, 0), Err(RejectionReason::NoAcceptedFits));
    }

    #[test]
    fn respiration_model_guards_physical_domain() {
        let s = series(&night_records(6, 100.0, 2.0));
        let opts = PartitionOptions::default();
        let daily = estimate_r10(&s, 100.0, &opts.respiration_rate, &opts.optimizer);
        let model = RespirationModel::new(100.0, &daily);

        assert_eq!(model.ter(T0, 0), Err(RejectionReason::PhysicalConstraintViolation { temperature: T0 }));
        assert_eq!(model.ter(f64::NAN, 0), Err(RejectionReason::MissingInput { field: "temperature" }));
        let ter = model.ter(283.15, 2).unwrap();
        assert!((ter - model.r10(2).unwrap().0).abs() < 1e-12);
        assert!(model.respiration_at(&s.observations()[0]).unwrap() > 0.0);
    }
}

//! Daytime light response and the continuous GPP model.
//!
//! Apparent GPP is `TER − NEE` at valid daytime observations, with TER taken
//! from the already-built [`RespirationModel`]. For every calendar day the
//! hyperbolic light-response curve is fitted to `(PPFD, apparent GPP)` with
//! the same adaptive window engine as R10, and the accepted `(α, GPmax)`
//! pairs are gap-filled into a [`LightResponseModel`]. Night-time GPP is zero.
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    optimization::least_squares::FitOptions,
    partition::{
        data::{Observation, ObservationSeries, Period},
        errors::RejectionReason,
        fit::{fit_window, FitPoint, ParamSpec},
        interpolation::{fill_gaps, FilledValue, Provenance},
        models::{light_response, HyperbolicLightResponse},
        options::LightResponseOptions,
        respiration::RespirationModel,
        window::{day_span, fit_adaptive, DailyEstimate},
    },
    utils::{median, percentile, through_origin_slope},
};

/// Apparent GPP points of each calendar day.
///
/// Daytime observations whose TER cannot be evaluated are skipped.
pub fn apparent_gpp(series: &ObservationSeries, respiration: &RespirationModel) -> Vec<Vec<FitPoint>> {
    (0..series.n_days())
        .map(|d| {
            series
                .day_indices(d)
                .iter()
                .filter_map(|&i| {
                    let obs = &series.observations()[i];
                    let ter = respiration.respiration_at(obs).ok()?;
                    Some(FitPoint { x: obs.ppfd?, y: ter - obs.nee? })
                })
                .collect()
        })
        .collect()
}

/// Fit `(α, GPmax)` for every calendar day.
pub fn estimate_light_response(
    series: &ObservationSeries, respiration: &RespirationModel, opts: &LightResponseOptions,
    fit_opts: &FitOptions,
) -> Vec<DailyEstimate> {
    let n_days = series.n_days();
    let per_day = apparent_gpp(series, respiration);

    let daily: Vec<DailyEstimate> = (0..n_days)
        .into_par_iter()
        .map(|d| {
            let outcome = fit_adaptive(&opts.schedule, |width| {
                let span = day_span(d, width, n_days);
                let span_days = span.len();
                let points: Vec<FitPoint> = per_day[span].iter().flatten().copied().collect();
                let (alpha, gp_max) = light_response_start(&points, opts);
                let specs = [
                    ParamSpec { name: "alpha", bounds: opts.alpha_bounds, initial: alpha },
                    ParamSpec { name: "GPmax", bounds: opts.gp_max_bounds, initial: gp_max },
                ];
                fit_window(&HyperbolicLightResponse, &specs, &points, span_days, &opts.acceptance, fit_opts)
            });
            if let Some(reason) = outcome.rejection() {
                debug!(day = %series.days()[d], %reason, "light-response day rejected");
            }
            DailyEstimate { day: series.days()[d], day_index: d, outcome }
        })
        .collect();

    let accepted = daily.iter().filter(|d| d.outcome.fit().is_some()).count();
    if accepted == 0 {
        warn!(days = n_days, "no daily light-response fit accepted");
    } else {
        info!(accepted, gaps = n_days - accepted, "daily light response estimated");
    }
    daily
}

/// α from a through-origin fit of the low-light half, GPmax from the 95th
/// percentile of apparent GPP.
fn light_response_start(points: &[FitPoint], opts: &LightResponseOptions) -> (f64, f64) {
    let ppfd: Vec<f64> = points.iter().map(|p| p.x).collect();
    let alpha = median(&ppfd)
        .and_then(|cut| {
            let (x, y): (Vec<f64>, Vec<f64>) =
                points.iter().filter(|p| p.x <= cut).map(|p| (p.x, p.y)).unzip();
            through_origin_slope(&x, &y)
        })
        .filter(|a| !opts.alpha_bounds.excludes(*a))
        .unwrap_or(opts.alpha_guess);

    let gpp: Vec<f64> = points.iter().map(|p| p.y).collect();
    let gp_max = percentile(&gpp, 95)
        .filter(|g| !opts.gp_max_bounds.excludes(*g))
        .unwrap_or(opts.gp_max_guess);
    (alpha, gp_max)
}

/// Continuous GPP model over gap-filled daily `(α, GPmax)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LightResponseModel {
    filled: Option<Vec<FilledValue>>,
}

impl LightResponseModel {
    pub fn new(daily: &[DailyEstimate]) -> Self {
        Self { filled: fill_gaps(daily) }
    }

    /// `(α, GPmax)` in effect on `day_index` and where they came from.
    ///
    /// Indices past the last day use the last day's values.
    pub fn parameters(&self, day_index: usize) -> Result<(f64, f64, Provenance), RejectionReason> {
        let filled = self.filled.as_deref().ok_or(RejectionReason::NoAcceptedFits)?;
        let value = filled
            .get(day_index)
            .or_else(|| filled.last())
            .ok_or(RejectionReason::NoAcceptedFits)?;
        Ok((value.values[0], value.values[1], value.provenance))
    }

    pub fn gpp(&self, ppfd: f64, day_index: usize) -> Result<f64, RejectionReason> {
        if !ppfd.is_finite() {
            return Err(RejectionReason::MissingInput { field: "ppfd" });
        }
        let (alpha, gp_max, _) = self.parameters(day_index)?;
        Ok(light_response(ppfd, alpha, gp_max))
    }

    /// GPP at an observation: zero at night, the model value by day.
    pub fn gpp_at(&self, obs: &Observation) -> Result<f64, RejectionReason> {
        match obs.period {
            Period::Night => Ok(0.0),
            Period::Unknown => Err(RejectionReason::MissingInput { field: "ppfd" }),
            Period::Day => {
                let ppfd = obs.ppfd.ok_or(RejectionReason::MissingInput { field: "ppfd" })?;
                self.gpp(ppfd, obs.day_index)
            }
        }
    }
}

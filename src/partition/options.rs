//! Configuration for NEE partitioning.
//!
//! Purpose
//! -------
//! Bundle every threshold used by the pipeline into one serde-friendly
//! structure, [`PartitionOptions`], with documented defaults and a single
//! validation entry point. Physical constants (`T0`, `TREF`) are not
//! configurable and live in [`models`](super::models).
//!
//! Key behaviors
//! -------------
//! - Every struct derives `Deserialize` with `#[serde(default)]`, so host-side
//!   configuration files only need to list the fields they override.
//! - [`PartitionOptions::validate`] rejects inconsistent values (even window
//!   widths, `initial > max`, empty bounds, `min_points` below the number of
//!   free parameters + 1, invalid optimizer tolerances) before any fit runs.
//!
//! Defaults
//! --------
//! | option                                   | default          |
//! |------------------------------------------|------------------|
//! | day/night PPFD threshold                 | 20 µmol m⁻² s⁻¹  |
//! | plausible NEE range                      | [−100, 100]      |
//! | maximum accepted upstream QC flag        | 1                |
//! | minimum points per fit                   | 20               |
//! | maximum relative standard error          | 0.5              |
//! | boundary tolerance (relative)            | 0.01             |
//! | E0 window / minimum temperature range    | 15 days / 5 K    |
//! | E0 bounds / R10 bounds                   | (0, 450) / (0, 50) |
//! | R10 and light-response schedules         | 5, 7, …, 15 days |
//! | α bounds / GPmax bounds                  | (0, 0.5) / (0, 150) |
use serde::{Deserialize, Serialize};

use crate::{
    optimization::{least_squares::FitOptions, numerical_stability::ParamBounds},
    partition::{
        errors::{PartitionError, PartitionResult},
        window::WindowSchedule,
    },
};

/// Quality-filter thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityOptions {
    /// PPFD at or above which a record is daytime.
    pub day_ppfd_threshold: f64,
    /// Inclusive plausible NEE range `[min, max]`.
    pub nee_min: f64,
    pub nee_max: f64,
    /// Upstream QC flags above this value invalidate the record.
    pub max_qc_flag: u8,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self { day_ppfd_threshold: 20.0, nee_min: -100.0, nee_max: 100.0, max_qc_flag: 1 }
    }
}

/// Acceptance predicate shared by every windowed fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcceptanceCriteria {
    pub min_points: usize,
    /// Upper limit on `std_error / |value|` for every free parameter.
    pub max_relative_error: f64,
    /// A value within `boundary_rtol · |bound|` of a bound is rejected.
    pub boundary_rtol: f64,
}

impl Default for AcceptanceCriteria {
    fn default() -> Self {
        Self { min_points: 20, max_relative_error: 0.5, boundary_rtol: 0.01 }
    }
}

/// Joint (E0, R10) fits in fixed night-time windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureSensitivityOptions {
    /// Odd window width in days, centred on each day.
    pub window_days: usize,
    /// Minimum night temperature span (K) inside a window.
    pub min_temperature_range: f64,
    pub acceptance: AcceptanceCriteria,
    pub e0_bounds: ParamBounds,
    pub r10_bounds: ParamBounds,
    /// Fallbacks when the log-linear starting regression is unusable.
    pub e0_guess: f64,
    pub r10_guess: f64,
}

impl Default for TemperatureSensitivityOptions {
    fn default() -> Self {
        Self {
            window_days: 15,
            min_temperature_range: 5.0,
            acceptance: AcceptanceCriteria::default(),
            e0_bounds: ParamBounds { lower: 0.0, upper: 450.0 },
            r10_bounds: ParamBounds { lower: 0.0, upper: 50.0 },
            e0_guess: 100.0,
            r10_guess: 1.0,
        }
    }
}

/// Daily R10 fits with E0 fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RespirationRateOptions {
    pub schedule: WindowSchedule,
    pub acceptance: AcceptanceCriteria,
    pub r10_bounds: ParamBounds,
    pub r10_guess: f64,
}

impl Default for RespirationRateOptions {
    fn default() -> Self {
        Self {
            schedule: WindowSchedule::default(),
            acceptance: AcceptanceCriteria::default(),
            r10_bounds: ParamBounds { lower: 0.0, upper: 50.0 },
            r10_guess: 1.0,
        }
    }
}

/// Daily (α, GPmax) fits against daytime apparent GPP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightResponseOptions {
    pub schedule: WindowSchedule,
    pub acceptance: AcceptanceCriteria,
    pub alpha_bounds: ParamBounds,
    pub gp_max_bounds: ParamBounds,
    pub alpha_guess: f64,
    pub gp_max_guess: f64,
}

impl Default for LightResponseOptions {
    fn default() -> Self {
        Self {
            schedule: WindowSchedule::default(),
            acceptance: AcceptanceCriteria::default(),
            alpha_bounds: ParamBounds { lower: 0.0, upper: 0.5 },
            gp_max_bounds: ParamBounds { lower: 0.0, upper: 150.0 },
            alpha_guess: 0.02,
            gp_max_guess: 10.0,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionOptions {
    pub quality: QualityOptions,
    pub temperature_sensitivity: TemperatureSensitivityOptions,
    pub respiration_rate: RespirationRateOptions,
    pub light_response: LightResponseOptions,
    pub optimizer: FitOptions,
}

impl PartitionOptions {
    /// Check every section; the first inconsistency is reported.
    ///
    /// # Errors
    /// - [`PartitionError::InvalidOptions`] naming the offending field.
    /// - [`PartitionError::Optimizer`] for invalid optimizer tolerances.
    pub fn validate(&self) -> PartitionResult<()> {
        let q = &self.quality;
        check_finite("quality.day_ppfd_threshold", q.day_ppfd_threshold)?;
        if !(q.nee_min.is_finite() && q.nee_max.is_finite() && q.nee_min < q.nee_max) {
            return Err(invalid("quality.nee_min", "NEE range must be finite with min < max"));
        }

        let ts = &self.temperature_sensitivity;
        if ts.window_days == 0 || ts.window_days % 2 == 0 {
            return Err(invalid("temperature_sensitivity.window_days", "must be a positive odd number"));
        }
        if !(ts.min_temperature_range >= 0.0) {
            return Err(invalid("temperature_sensitivity.min_temperature_range", "must be >= 0"));
        }
        check_acceptance("temperature_sensitivity.acceptance", &ts.acceptance, 2)?;
        check_bounds("temperature_sensitivity.e0_bounds", &ts.e0_bounds)?;
        check_bounds("temperature_sensitivity.r10_bounds", &ts.r10_bounds)?;
        check_finite("temperature_sensitivity.e0_guess", ts.e0_guess)?;
        check_finite("temperature_sensitivity.r10_guess", ts.r10_guess)?;

        let rr = &self.respiration_rate;
        rr.schedule.validate("respiration_rate.schedule")?;
        check_acceptance("respiration_rate.acceptance", &rr.acceptance, 1)?;
        check_bounds("respiration_rate.r10_bounds", &rr.r10_bounds)?;
        check_finite("respiration_rate.r10_guess", rr.r10_guess)?;

        let lr = &self.light_response;
        lr.schedule.validate("light_response.schedule")?;
        check_acceptance("light_response.acceptance", &lr.acceptance, 2)?;
        check_bounds("light_response.alpha_bounds", &lr.alpha_bounds)?;
        check_bounds("light_response.gp_max_bounds", &lr.gp_max_bounds)?;
        check_finite("light_response.alpha_guess", lr.alpha_guess)?;
        check_finite("light_response.gp_max_guess", lr.gp_max_guess)?;

        self.optimizer.validate()?;
        Ok(())
    }
}

pub(crate) fn invalid(field: &'static str, reason: &str) -> PartitionError {
    PartitionError::InvalidOptions { field, reason: reason.to_string() }
}

fn check_finite(field: &'static str, value: f64) -> PartitionResult<()> {
    if !value.is_finite() {
        return Err(invalid(field, "must be finite"));
    }
    Ok(())
}

fn check_bounds(field: &'static str, bounds: &ParamBounds) -> PartitionResult<()> {
    if !(bounds.lower.is_finite() && bounds.upper.is_finite()) {
        return Err(invalid(field, "physical bounds must be finite"));
    }
    bounds.validate().map_err(|e| invalid(field, &e.to_string()))
}

fn check_acceptance(
    field: &'static str, acceptance: &AcceptanceCriteria, n_params: usize,
) -> PartitionResult<()> {
    if acceptance.min_points < n_params + 1 {
        return Err(PartitionError::InvalidOptions {
            field,
            reason: format!("min_points must be at least {} for {n_params} parameter(s)", n_params + 1),
        });
    }
    if !(acceptance.max_relative_error > 0.0) {
        return Err(invalid(field, "max_relative_error must be > 0"));
    }
    if !(acceptance.boundary_rtol >= 0.0 && acceptance.boundary_rtol < 1.0) {
        return Err(invalid(field, "boundary_rtol must lie in [0, 1)"));
    }
    Ok(())
}

//! Errors for NEE partitioning (series validation, configuration, and the
//! per-window / per-day rejection reasons recorded in diagnostics).
//!
//! ## Conventions
//! - [`RejectionReason`] is **local and non-fatal**: it describes why one
//!   window or day produced no estimate. It is stored in the output, never
//!   raised.
//! - [`PartitionError`] is **fatal**: invalid input series, invalid options,
//!   or the total failure of the temperature-sensitivity stage.
use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;

use crate::optimization::errors::OptError;

/// Result alias for partitioning entry points that may fail with [`PartitionError`].
pub type PartitionResult<T> = Result<T, PartitionError>;

/// Why a single window fit, a day, or a single evaluation produced no value.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum RejectionReason {
    // ---- Data ----
    /// Fewer eligible points than the acceptance criteria require.
    #[error("insufficient data: {available} points available, {required} required")]
    InsufficientData { available: usize, required: usize },

    /// Night temperatures in the window span too narrow a range to identify E0.
    #[error("temperature range {range:.2} K below required {required:.2} K")]
    NarrowTemperatureRange { range: f64, required: f64 },

    // ---- Fit ----
    /// The optimizer failed or stopped without converging.
    #[error("optimizer did not converge: {status}")]
    ConvergenceFailure { status: String },

    /// Fitted value outside, or within the boundary tolerance of, its bounds.
    #[error("{parameter} = {value} outside or at bounds ({lower}, {upper})")]
    ParameterOutOfBounds { parameter: &'static str, value: f64, lower: f64, upper: f64 },

    /// Relative standard error above the configured limit.
    #[error("{parameter} relative standard error {relative_error:.3} exceeds {limit}")]
    ExcessiveUncertainty { parameter: &'static str, relative_error: f64, limit: f64 },

    // ---- Evaluation ----
    /// Temperature at or below T0; the respiration model is undefined.
    #[error("temperature {temperature} K at or below T0")]
    PhysicalConstraintViolation { temperature: f64 },

    /// A driver needed to evaluate the model is missing or non-finite.
    #[error("missing input: {field}")]
    MissingInput { field: &'static str },

    /// No day of the series produced an accepted fit, so nothing can be gap-filled.
    #[error("no day of the series has an accepted fit")]
    NoAcceptedFits,
}

impl RejectionReason {
    fn bucket(&self, counts: &mut RejectionCounts) {
        match self {
            RejectionReason::InsufficientData { .. } => counts.insufficient_data += 1,
            RejectionReason::NarrowTemperatureRange { .. } => counts.narrow_temperature_range += 1,
            RejectionReason::ConvergenceFailure { .. } => counts.convergence_failure += 1,
            RejectionReason::ParameterOutOfBounds { .. } => counts.parameter_out_of_bounds += 1,
            RejectionReason::ExcessiveUncertainty { .. } => counts.excessive_uncertainty += 1,
            RejectionReason::PhysicalConstraintViolation { .. }
            | RejectionReason::MissingInput { .. }
            | RejectionReason::NoAcceptedFits => counts.other += 1,
        }
    }
}

/// Tally of rejection reasons, used in summaries and fatal error messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounts {
    pub insufficient_data: usize,
    pub narrow_temperature_range: usize,
    pub convergence_failure: usize,
    pub parameter_out_of_bounds: usize,
    pub excessive_uncertainty: usize,
    pub other: usize,
}

impl RejectionCounts {
    pub fn tally<'a, I: IntoIterator<Item = &'a RejectionReason>>(reasons: I) -> Self {
        let mut counts = Self::default();
        for reason in reasons {
            reason.bucket(&mut counts);
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.insufficient_data
            + self.narrow_temperature_range
            + self.convergence_failure
            + self.parameter_out_of_bounds
            + self.excessive_uncertainty
            + self.other
    }
}

impl fmt::Display for RejectionCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient data {}, narrow temperature range {}, convergence failure {}, \
             out of bounds {}, excessive uncertainty {}, other {}",
            self.insufficient_data,
            self.narrow_temperature_range,
            self.convergence_failure,
            self.parameter_out_of_bounds,
            self.excessive_uncertainty,
            self.other
        )
    }
}

/// Fatal partitioning errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PartitionError {
    // ---- Input series ----
    #[error("input series is empty")]
    EmptySeries,

    #[error("timestamps not strictly increasing at index {index}: {current} after {previous}")]
    NonMonotonicTimestamps { index: usize, previous: NaiveDateTime, current: NaiveDateTime },

    #[error("irregular sampling at index {index}: step of {found}, expected {expected}")]
    IrregularSampling { index: usize, expected: Duration, found: Duration },

    // ---- Configuration ----
    #[error("invalid option `{field}`: {reason}")]
    InvalidOptions { field: &'static str, reason: String },

    #[error("invalid optimizer options: {0}")]
    Optimizer(#[from] OptError),

    // ---- Estimation ----
    /// Zero temperature-sensitivity windows were accepted; nothing downstream is derivable.
    #[error("temperature sensitivity unavailable: none of {windows} windows accepted ({counts})")]
    TemperatureSensitivityUnavailable { windows: usize, counts: RejectionCounts },
}

//! Window schedules and the adaptive widening loop.
//!
//! A day's estimate is produced by walking an explicit, finite sequence of
//! window widths (default 5, 7, …, 15 days) and fitting at each width until
//! the acceptance predicate passes. The result is a tagged
//! [`AdaptiveOutcome`]: the first accepted fit, or the terminal rejection
//! reason together with every attempt.
use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::partition::{
    errors::{PartitionResult, RejectionReason},
    fit::{FitOutcome, FitResult, Rejection},
    options::invalid,
};

/// Odd window widths `initial_days, initial_days + step_days, …, ≤ max_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSchedule {
    pub initial_days: usize,
    pub max_days: usize,
    pub step_days: usize,
}

impl Default for WindowSchedule {
    fn default() -> Self {
        Self { initial_days: 5, max_days: 15, step_days: 2 }
    }
}

impl WindowSchedule {
    /// A schedule with a single width.
    pub fn fixed(days: usize) -> Self {
        Self { initial_days: days, max_days: days, step_days: 2 }
    }

    /// Widths in the order they are tried.
    pub fn widths(&self) -> impl Iterator<Item = usize> {
        (self.initial_days..=self.max_days).step_by(self.step_days.max(1))
    }

    /// Widths must stay odd so every window is centred on its day.
    pub fn validate(&self, field: &'static str) -> PartitionResult<()> {
        if self.initial_days == 0 || self.initial_days % 2 == 0 {
            return Err(invalid(field, "initial_days must be a positive odd number"));
        }
        if self.max_days < self.initial_days {
            return Err(invalid(field, "max_days must be >= initial_days"));
        }
        if self.step_days == 0 || self.step_days % 2 == 1 {
            return Err(invalid(field, "step_days must be a positive even number"));
        }
        Ok(())
    }
}

/// Day-index span of a `width`-day window centred on `center`, clipped to
/// `[0, n_days)`.
pub fn day_span(center: usize, width: usize, n_days: usize) -> Range<usize> {
    let half = width / 2;
    let start = center.saturating_sub(half);
    let end = (center + half + 1).min(n_days);
    start..end
}

/// Result of walking a window schedule for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum AdaptiveOutcome {
    /// First width whose fit passed acceptance; earlier rejected attempts kept.
    Accepted { fit: FitResult, attempts: Vec<Rejection> },
    /// No width passed; `reason` is the last attempt's rejection.
    Rejected { reason: RejectionReason, attempts: Vec<Rejection> },
}

impl AdaptiveOutcome {
    pub fn fit(&self) -> Option<&FitResult> {
        match self {
            AdaptiveOutcome::Accepted { fit, .. } => Some(fit),
            AdaptiveOutcome::Rejected { .. } => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            AdaptiveOutcome::Accepted { .. } => None,
            AdaptiveOutcome::Rejected { reason, .. } => Some(reason),
        }
    }
}

/// One calendar day's adaptive estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEstimate {
    pub day: NaiveDate,
    pub day_index: usize,
    pub outcome: AdaptiveOutcome,
}

/// Walk `schedule`, calling `fit_at(width)` until a fit is accepted.
///
/// An empty schedule yields `Rejected` with
/// [`RejectionReason::InsufficientData`] and no attempts.
pub fn fit_adaptive<F>(schedule: &WindowSchedule, mut fit_at: F) -> AdaptiveOutcome
where
    F: FnMut(usize) -> FitOutcome,
{
    let mut attempts = Vec::new();
    for width in schedule.widths() {
        match fit_at(width) {
            FitOutcome::Accepted(fit) => return AdaptiveOutcome::Accepted { fit, attempts },
            FitOutcome::Rejected(rejection) => attempts.push(rejection),
        }
    }
    let reason = attempts
        .last()
        .map(|r| r.reason.clone())
        .unwrap_or(RejectionReason::InsufficientData { available: 0, required: 0 });
    AdaptiveOutcome::Rejected { reason, attempts }
}

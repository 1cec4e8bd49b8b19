//! Box bounds for model parameters and their unconstrained reparameterization.
//!
//! The optimizer works on an unconstrained `θ ∈ ℝ`. [`ParamBounds`] maps it
//! into the admissible interval:
//!
//! | bounds              | value `v(θ)`                    |
//! |---------------------|---------------------------------|
//! | `(lo, hi)` finite   | `lo + (hi − lo)·logistic(θ)`    |
//! | `(lo, ∞)`           | `lo + softplus(θ)`              |
//! | `(−∞, hi)`          | `hi − softplus(θ)`              |
//! | `(−∞, ∞)`           | `θ`                             |
//!
//! so every trial point seen by a model is strictly inside its bounds.
use serde::{Deserialize, Serialize};

use crate::optimization::{
    errors::{OptError, OptResult},
    numerical_stability::transformations::{
        safe_logistic, safe_logit, safe_softplus, safe_softplus_inv, GENERAL_TOL,
    },
};

/// Open interval `(lower, upper)` of admissible parameter values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ParamBounds {
    /// Validated bounds. Infinite ends are allowed; NaN is not.
    ///
    /// # Errors
    /// [`OptError::InvalidBounds`] if either end is NaN or `lower >= upper`.
    pub fn new(lower: f64, upper: f64) -> OptResult<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn unbounded() -> Self {
        Self { lower: f64::NEG_INFINITY, upper: f64::INFINITY }
    }

    pub fn validate(&self) -> OptResult<()> {
        if self.lower.is_nan() || self.upper.is_nan() {
            return Err(OptError::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
                reason: "Bounds must not be NaN.",
            });
        }
        if self.lower >= self.upper {
            return Err(OptError::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
                reason: "Lower bound must be strictly below the upper bound.",
            });
        }
        Ok(())
    }

    /// Map unconstrained `θ` to the model value `v(θ)`.
    pub fn to_model(&self, theta: f64) -> f64 {
        match (self.lower.is_finite(), self.upper.is_finite()) {
            (true, true) => self.lower + (self.upper - self.lower) * safe_logistic(theta),
            (true, false) => self.lower + safe_softplus(theta),
            (false, true) => self.upper - safe_softplus(theta),
            (false, false) => theta,
        }
    }

    /// Map a model value back to `θ`. Values on or outside the bounds are
    /// pulled just inside so the result stays finite.
    pub fn to_unconstrained(&self, value: f64) -> f64 {
        match (self.lower.is_finite(), self.upper.is_finite()) {
            (true, true) => safe_logit((value - self.lower) / (self.upper - self.lower)),
            (true, false) => safe_softplus_inv((value - self.lower).max(GENERAL_TOL)),
            (false, true) => safe_softplus_inv((self.upper - value).max(GENERAL_TOL)),
            (false, false) => value,
        }
    }

    /// Derivative `dv/dθ` of [`ParamBounds::to_model`].
    pub fn derivative(&self, theta: f64) -> f64 {
        match (self.lower.is_finite(), self.upper.is_finite()) {
            (true, true) => {
                let s = safe_logistic(theta);
                (self.upper - self.lower) * s * (1.0 - s)
            }
            (true, false) => safe_logistic(theta),
            (false, true) => -safe_logistic(theta),
            (false, false) => 1.0,
        }
    }

    /// `true` when `value` is outside the open interval.
    pub fn excludes(&self, value: f64) -> bool {
        !(value > self.lower && value < self.upper)
    }

    /// `true` when `value` is close to a finite bound in the sense of
    /// `|v − b| ≤ GENERAL_TOL + rtol·|b|`.
    pub fn is_near_bound(&self, value: f64, rtol: f64) -> bool {
        [self.lower, self.upper]
            .iter()
            .filter(|b| b.is_finite())
            .any(|&b| (value - b).abs() <= GENERAL_TOL + rtol * b.abs())
    }
}

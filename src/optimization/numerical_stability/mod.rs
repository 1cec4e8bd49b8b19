//! numerical_stability — numerically robust transforms and parameter bounds.
//!
//! Purpose
//! -------
//! Collect stable scalar transforms and the [`ParamBounds`] reparameterization
//! used to keep bounded curve parameters (E0, R10, α, GPmax) strictly inside
//! their admissible intervals while the optimizer searches an unconstrained
//! space.
//!
//! Key behaviors
//! -------------
//! - Stable scalar transforms (`safe_softplus`, its inverse, `safe_logistic`,
//!   `safe_logit`) that never overflow.
//! - [`ParamBounds`] maps `θ ↔ value` and exposes `dv/dθ` for chain-rule
//!   gradients, plus the "near a bound" test used by fit acceptance.
//! - Shared tolerances (`LOGIT_EPS`, `EIGEN_EPS`, `GENERAL_TOL`).
//!
//! Conventions
//! -----------
//! - Pure functions on `f64`; no logging, no I/O, no global state.

pub mod bounds;
pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bounds::ParamBounds;
pub use self::transformations::{
    safe_logistic, safe_logit, safe_softplus, safe_softplus_inv, EIGEN_EPS, GENERAL_TOL, LOGIT_EPS,
};

pub mod prelude {
    pub use super::bounds::ParamBounds;
    pub use super::transformations::{safe_logistic, safe_softplus, EIGEN_EPS, GENERAL_TOL};
}

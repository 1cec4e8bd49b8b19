//! inference — post-estimation uncertainty for least-squares curve fits.
//!
//! Purpose
//! -------
//! Turn a fitted curve (model Jacobian and residuals at the estimate) into
//! parameter standard errors in **model space**, which the fit acceptance
//! rules compare against the estimates (relative standard error).
//!
//! Key behaviors
//! -------------
//! - [`least_squares_standard_errors`]: `s²·(JᵀJ)⁺` via a symmetric
//!   eigendecomposition (`nalgebra`), infinite for unidentified parameters.
//!
//! Conventions
//! -----------
//! - Jacobians are `n × p` with rows for observations and columns for
//!   parameters, taken with respect to the physical parameters (not the
//!   unconstrained optimizer coordinates).
//! - Failures are reported as [`OptError`](crate::optimization::errors::OptError).

pub mod standard_errors;

pub use self::standard_errors::least_squares_standard_errors;

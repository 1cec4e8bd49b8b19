//! least_squares::finite_diff — finite-difference gradient fallback.
//!
//! [`run_fd_diff`] computes a forward-difference gradient with error capture
//! and post-hoc validation. The adapter uses it after a failed central pass.
//!
//! Conventions
//! -----------
//! - Errors raised by the objective inside the FD closure are parked in a
//!   shared `closure_err` cell and surfaced as the first failure.
use crate::optimization::{
    errors::OptResult,
    least_squares::{validation::validate_grad, Grad, Theta},
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Compute a forward-difference gradient of `func` at `theta`.
///
/// # Errors
/// - Any error recorded in `closure_err` during evaluation.
/// - `OptError::GradientDimMismatch` or `OptError::InvalidGradient`
///   if the result fails [`validate_grad`].
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}

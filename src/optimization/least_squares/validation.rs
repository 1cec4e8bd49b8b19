//! Validation helpers for objective minimization.
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`].
//! - **Gradient validation**: [`validate_grad`] enforces dimension and finite entries.
//! - **Parameter estimates**: [`validate_theta_hat`], [`validate_theta`].
//! - **Objective values**: [`validate_value`].
//! - **Information matrices**: [`validate_information`].
use crate::optimization::{
    errors::{OptError, OptResult},
    least_squares::{types::Matrix, Grad, Theta},
};

/// Validate the optional gradient-norm tolerance (finite and `> 0` when present).
pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost-change tolerance (finite and `> 0` when present).
pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if `grad.len() != dim`.
/// - [`OptError::InvalidGradient`] for the first non-finite element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate a starting point: all entries finite.
///
/// The expected length is problem-specific and checked by [`Objective::check`](super::Objective::check).
pub fn validate_theta(theta: &Theta) -> OptResult<()> {
    for (index, &value) in theta.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaInput { index, value });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector.
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if the solver did not report one.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let t = theta_hat.ok_or(OptError::MissingThetaHat)?;
    for (index, &value) in t.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Parameter estimates must be finite.",
            });
        }
    }
    Ok(t)
}

/// Validate that a scalar cost is finite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// Validate the shape and entries of an information matrix (`dim × dim`, finite).
pub fn validate_information(info: &Matrix, dim: usize) -> OptResult<()> {
    if info.nrows() != dim || info.ncols() != dim {
        return Err(OptError::InformationDimMismatch {
            expected: dim,
            found: (info.nrows(), info.ncols()),
        });
    }
    for ((row, col), &value) in info.indexed_iter() {
        if !value.is_finite() {
            return Err(OptError::InvalidInformation { row, col, value });
        }
    }
    Ok(())
}

//! Adapter that exposes a user [`Objective`] as an `argmin` problem.
//!
//! The cost is passed through unchanged. Analytic gradients are validated; if
//! the objective does not provide one, the gradient is finite-differenced from
//! the cost closure (central first, forward as a fallback).
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    least_squares::{
        finite_diff::run_fd_diff,
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user [`Objective`] to argmin's `CostFunction` and `Gradient`.
pub struct ArgMinAdapter<'a, F: Objective + ?Sized> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: Objective + ?Sized> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<'a, F: Objective + ?Sized> CostFunction for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `c(θ)`; non-finite costs become [`OptError::NonFiniteCost`].
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.f.value(theta, self.data)?;
        if !output.is_finite() {
            return Err(OptError::NonFiniteCost { value: output }.into());
        }
        Ok(output)
    }
}

impl<'a, F: Objective + ?Sized> Gradient for ArgMinAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate `∇c(θ)`.
    ///
    /// - Analytic gradient from the objective, validated for shape/finiteness.
    /// - Otherwise a central-difference gradient of the cost. The FD closure
    ///   must return `f64`, so the first cost error is parked in `closure_err`
    ///   and `NaN` is returned; an error or an invalid central gradient
    ///   triggers a retry with forward differences.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let central = theta.central_diff(&cost_func);
                if closure_err.borrow().is_none() && validate_grad(&central, dim).is_ok() {
                    return Ok(central);
                }
                Ok(run_fd_diff(theta, &cost_func, &closure_err)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

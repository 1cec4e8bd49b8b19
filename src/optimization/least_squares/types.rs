//! least_squares::types — shared numeric aliases and solver wiring.
//!
//! Centralizes the parameter/gradient aliases and the pre-wired argmin solver
//! types so the rest of the optimizer never spells out argmin generics.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    neldermead::NelderMead,
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Unconstrained parameter vector `θ` seen by the solver.
pub type Theta = Array1<f64>;

/// Gradient of the cost with respect to `θ`.
pub type Grad = Array1<f64>;

/// Dense matrix (Jacobians, information matrices).
pub type Matrix = Array2<f64>;

/// Scalar cost minimized by the solver.
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// Derivative-free simplex solver used when the L-BFGS line search breaks down.
pub type Simplex = NelderMead<Theta, Cost>;

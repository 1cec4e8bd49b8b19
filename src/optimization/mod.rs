//! optimization — least-squares minimizer, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for curve fitting, combining an
//! argmin-backed minimizer, numerically stable parameter transforms, and a
//! single error/result surface. Callers implement an objective, choose
//! tolerances, and obtain fitted parameters and diagnostics without touching
//! backend solver details.
//!
//! Key behaviors
//! -------------
//! - [`least_squares`]: **minimize** a cost `c(θ)` with L-BFGS (More–Thuente or
//!   Hager–Zhang line search), finite-difference gradients when no analytic
//!   gradient exists, and a Nelder–Mead fallback.
//! - [`numerical_stability`]: stable transforms and [`ParamBounds`](numerical_stability::ParamBounds)
//!   for mapping unconstrained θ into bounded physical parameters.
//! - [`errors`]: configuration issues, numerical failures, and backend solver
//!   errors normalized into [`OptError`](errors::OptError) / [`OptResult`](errors::OptResult).
//!
//! Conventions
//! -----------
//! - Parameters, gradients, and matrices use the `ndarray` aliases `Theta`,
//!   `Grad`, `Matrix`.
//! - Public entry points that can fail return `OptResult<T>`; callers never
//!   see raw argmin errors.
//! - This layer only emits `tracing::debug!` events when it switches solver;
//!   reporting is left to higher layers.

pub mod errors;
pub mod least_squares;
pub mod numerical_stability;

// Downstream code can write
//
//     use nee_partition::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::least_squares::prelude::*;
    pub use super::numerical_stability::prelude::*;
}

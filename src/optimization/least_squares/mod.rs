//! least_squares — argmin-powered minimizer for curve-fitting objectives.
//!
//! Purpose
//! -------
//! Provide a high-level optimization layer for **minimizing least-squares
//! costs** `c(θ)`. Callers implement a single trait, [`Objective`], and invoke
//! [`minimize`] to run L-BFGS with a configurable line search, tolerances,
//! finite-difference gradient fallbacks and an optional Nelder–Mead rescue.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] exposes an [`Objective`] as an argmin
//!   `CostFunction` + `Gradient`, finite-differencing when no analytic
//!   gradient is available.
//! - [`minimize`]:
//!   - validates the initial guess and calls [`Objective::check`],
//!   - selects an L-BFGS solver via [`builders`] based on [`traits::LineSearcher`],
//!   - executes it via [`run::run_lbfgs`],
//!   - falls back to [`run::run_simplex`] when enabled, and
//!   - normalizes results into an [`OptimOutcome`].
//! - [`finite_diff`] also offers a central-difference Jacobian used by the
//!   curve models for standard errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer works in an unconstrained space; bounded model parameters
//!   are mapped by the objective (see
//!   [`numerical_stability`](crate::optimization::numerical_stability)).
//! - [`Objective::value`] and [`Objective::grad`] report invalid inputs as
//!   [`OptError`](crate::optimization::errors::OptError) values, never panics.
//! - [`OptimOutcome::converged`] is `true` only for genuine convergence;
//!   hitting the iteration cap is reported as non-converged.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover gradient handling in [`adapter`], solver
//!   construction in [`builders`], FD helpers, validation, and end-to-end
//!   minimization of small problems in [`api`].

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::traits::{FitOptions, LineSearcher, Objective, OptimOutcome, SolverKind, Tolerances};
pub use self::types::{Cost, FnEvalMap, Grad, Matrix, Theta, DEFAULT_LBFGS_MEM};

pub mod prelude {
    pub use super::api::minimize;
    pub use super::traits::{FitOptions, Objective, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}

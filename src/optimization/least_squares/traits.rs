//! Public API surface for objective minimization.
//!
//! - [`Objective`]: trait users implement for their fitting problem.
//! - [`FitOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by the high-level `minimize` API.
//!
//! Convention: the solver *minimizes* `c(θ)` in an unconstrained space. Any
//! mapping between θ and bounded model parameters is the objective's business.
use crate::optimization::{
    errors::{OptError, OptResult},
    least_squares::{
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
        Cost, FnEvalMap, Grad, Theta,
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// User-implemented objective interface.
///
/// - `type Data`: per-problem data carried into `value`/`grad`/`check`. May be
///   unsized (e.g. a slice of fit points).
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `c(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: reject obviously invalid
///   `θ`/`data` pairs. Called once before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇c(θ)`.
///   If not implemented, finite differences of `value` are used.
pub trait Objective {
    type Data: ?Sized;

    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parses case-insensitively from `"MoreThuente"` / `"HagerZhang"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Solver that produced an [`OptimOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolverKind {
    Lbfgs,
    NelderMead,
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols` — numerical tolerances and iteration limits.
/// - `line_searcher` — line-search algorithm used by L-BFGS.
/// - `lbfgs_mem` — L-BFGS history size; `None` uses [`DEFAULT_LBFGS_MEM`](super::DEFAULT_LBFGS_MEM).
/// - `nelder_mead_fallback` — retry with a Nelder–Mead simplex when the
///   L-BFGS backend fails (typically a line search that can no longer find a
///   descent direction near the optimum).
/// - `verbose` — with the `obs_slog` feature, attach argmin's terminal observer.
///
/// Default:
/// - `tols`: `tol_grad = 1e-9`, `tol_cost = 1e-12`, `max_iter = 500`
/// - `line_searcher`: `MoreThuente`
/// - `lbfgs_mem`: `None`
/// - `nelder_mead_fallback`: `true`
/// - `verbose`: `false`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: Option<usize>,
    pub nelder_mead_fallback: bool,
    pub verbose: bool,
}

impl FitOptions {
    /// Create validated optimizer options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        let opts = Self { tols, line_searcher, lbfgs_mem, nelder_mead_fallback: true, verbose: false };
        opts.validate()?;
        Ok(opts)
    }

    /// Re-check options that may have been built field by field (e.g. deserialized).
    pub fn validate(&self) -> OptResult<()> {
        if let Some(mem) = self.lbfgs_mem {
            if mem == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Tolerances::new(self.tols.tol_grad, self.tols.tol_cost, self.tols.max_iter)?;
        Ok(())
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.nelder_mead_fallback = enabled;
        self
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-9), tol_cost: Some(1e-12), max_iter: Some(500) },
            line_searcher: LineSearcher::MoreThuente,
            lbfgs_mem: None,
            nelder_mead_fallback: true,
            verbose: false,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but at least one must be provided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if max_iter == Some(0) {
            return Err(OptError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `minimize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best cost `c(θ̂)`.
/// - `converged`: `true` only when the solver stopped on a convergence
///   criterion (gradient/cost tolerance, simplex spread or target cost).
///   Exhausting `max_iter` is reported as `false`.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: argmin's function-evaluation counters.
/// - `grad_norm`: norm of the last available gradient, if present.
/// - `solver`: which solver produced the estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
    pub solver: SolverKind,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// Propagates validation errors for `theta_hat` (missing or non-finite) and
    /// `value` (non-finite).
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>, solver: SolverKind,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match &termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => (
                matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                ),
                format!("{reason:?}"),
            ),
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            value,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
            solver,
        })
    }
}

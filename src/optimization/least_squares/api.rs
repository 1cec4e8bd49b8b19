//! least_squares::api — the user-facing `minimize` entry point.
use crate::optimization::{
    errors::OptResult,
    least_squares::{
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente, build_simplex},
        run::{run_lbfgs, run_simplex},
        traits::{FitOptions, LineSearcher, Objective, OptimOutcome},
        validation::validate_theta,
        Theta,
    },
};
use tracing::debug;

/// Minimize `f` starting from `theta0`.
///
/// 1. Validates `theta0` (finite entries) and calls [`Objective::check`].
/// 2. Runs L-BFGS with the configured line search.
/// 3. With `opts.nelder_mead_fallback`:
///    - if L-BFGS fails outright, restarts from `theta0` with a Nelder–Mead simplex;
///    - if L-BFGS stops without converging, polishes its estimate with a
///      simplex and keeps whichever outcome has the lower cost.
///
/// # Errors
/// Validation errors from `check`/`theta0`, and solver errors when no
/// fallback is enabled (or the fallback fails as well).
pub fn minimize<F: Objective + ?Sized>(
    f: &F, theta0: Theta, data: &F::Data, opts: &FitOptions,
) -> OptResult<OptimOutcome> {
    validate_theta(&theta0)?;
    f.check(&theta0, data)?;
    let lbfgs = match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0.clone(), opts, ArgMinAdapter::new(f, data), solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0.clone(), opts, ArgMinAdapter::new(f, data), solver)
        }
    };
    if !opts.nelder_mead_fallback {
        return lbfgs;
    }
    match lbfgs {
        Ok(outcome) if outcome.converged => Ok(outcome),
        Ok(outcome) => {
            debug!(status = %outcome.status, cost = outcome.value, "L-BFGS did not converge, polishing with simplex");
            let simplex = build_simplex(&outcome.theta_hat, opts)?;
            match run_simplex(opts, ArgMinAdapter::new(f, data), simplex) {
                Ok(polished) if polished.value <= outcome.value => Ok(polished),
                _ => Ok(outcome),
            }
        }
        Err(err) => {
            debug!(error = %err, "L-BFGS failed, retrying with simplex");
            let simplex = build_simplex(&theta0, opts)?;
            run_simplex(opts, ArgMinAdapter::new(f, data), simplex)
        }
    }
}

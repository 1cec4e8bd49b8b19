//! least_squares::builders — construct argmin solvers from [`FitOptions`].
//!
//! - [`build_optimizer_hager_zhang`] / [`build_optimizer_more_thuente`]:
//!   L-BFGS with the chosen line search and configured tolerances.
//! - [`build_simplex`]: Nelder–Mead around a starting point, used as the
//!   derivative-free fallback.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    least_squares::{
        traits::FitOptions,
        types::{
            Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Simplex,
            Theta, DEFAULT_LBFGS_MEM,
        },
    },
};

/// Relative perturbation used to span the initial simplex.
const SIMPLEX_REL_STEP: f64 = 0.05;
/// Absolute perturbation for coordinates that start at (or near) zero.
const SIMPLEX_ZERO_STEP: f64 = 2.5e-4;
/// Spread tolerance for the simplex when no cost tolerance is configured.
const SIMPLEX_DEFAULT_SD_TOL: f64 = 1e-12;

pub fn build_optimizer_hager_zhang(opts: &FitOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

pub fn build_optimizer_more_thuente(opts: &FitOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply the gradient/cost tolerances that are present in `opts`.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &FitOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Build a Nelder–Mead solver whose initial simplex is `theta0` plus one
/// vertex per coordinate, shifted by 5% of that coordinate (or `2.5e-4` when
/// the coordinate is essentially zero).
pub fn build_simplex(theta0: &Theta, opts: &FitOptions) -> OptResult<Simplex> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut v = theta0.clone();
        v[i] = if v[i].abs() > 1e-8 { v[i] * (1.0 + SIMPLEX_REL_STEP) } else { SIMPLEX_ZERO_STEP };
        vertices.push(v);
    }
    let sd_tol = opts.tols.tol_cost.unwrap_or(SIMPLEX_DEFAULT_SD_TOL);
    Ok(Simplex::new(vertices).with_sd_tolerance(sd_tol)?)
}

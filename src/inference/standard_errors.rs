//! Least-squares standard errors from the Gauss–Newton information matrix.
//!
//! For residuals `r` (n) and model Jacobian `J` (n × p) at the estimate,
//!
//! ```text
//! s²  = SSE / (n − p)
//! Cov = s² · (JᵀJ)⁺
//! ```
//!
//! The pseudo-inverse is taken through a symmetric eigendecomposition with
//! eigenvalues below `EIGEN_EPS · λ_max` discarded. A parameter that loads on a
//! discarded direction is not identified by the data and gets an infinite
//! standard error, as does every parameter when `n ≤ p`.
use crate::optimization::{
    errors::{OptError, OptResult},
    least_squares::{validation::validate_information, Matrix},
    numerical_stability::EIGEN_EPS,
};
use nalgebra::DMatrix;
use ndarray::Array1;

/// Squared eigenvector loadings below this are treated as exact zeros.
const LOADING_EPS: f64 = 1e-12;

/// Standard errors of least-squares estimates.
///
/// # Errors
/// - [`OptError::JacobianDimMismatch`] if `jacobian.nrows() != residuals.len()`.
/// - [`OptError::InvalidInformation`] if `JᵀJ` has non-finite entries.
pub fn least_squares_standard_errors(
    jacobian: &Matrix, residuals: &Array1<f64>,
) -> OptResult<Array1<f64>> {
    let (n, p) = jacobian.dim();
    if n != residuals.len() {
        return Err(OptError::JacobianDimMismatch { rows: n, residuals: residuals.len() });
    }
    if n <= p {
        return Ok(Array1::from_elem(p, f64::INFINITY));
    }
    let info = jacobian.t().dot(jacobian);
    validate_information(&info, p)?;
    let s2 = residuals.dot(residuals) / (n - p) as f64;

    let mut info_nalg = DMatrix::<f64>::zeros(p, p);
    fill_dmatrix(&info, &mut info_nalg);
    Ok(solve_for_se(info_nalg, s2, p))
}

fn fill_dmatrix(info: &Matrix, info_nalg: &mut DMatrix<f64>) {
    for ((i, j), &v) in info.indexed_iter() {
        info_nalg[(i, j)] = v;
    }
}

fn solve_for_se(info_nalg: DMatrix<f64>, s2: f64, p: usize) -> Array1<f64> {
    let eigen_decomp = info_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;
    let lambda_max = eigenvals.iter().cloned().fold(0.0_f64, f64::max);
    let cutoff = EIGEN_EPS * lambda_max;

    let mut se = Array1::<f64>::zeros(p);
    for i in 0..p {
        let mut var = 0.0;
        for (k, &lambda) in eigenvals.iter().enumerate() {
            let loading = q[(i, k)] * q[(i, k)];
            if lambda > cutoff && lambda > 0.0 {
                var += loading / lambda;
            } else if loading > LOADING_EPS {
                var = f64::INFINITY;
                break;
            }
        }
        se[i] = if var.is_infinite() { f64::INFINITY } else { (s2 * var).sqrt() };
    }
    se
}

//! Windowed-fit engine shared by the respiration and light-response stages.
//!
//! Purpose
//! -------
//! Fit any [`CurveModel`] to a window of `(x, y)` points by bounded nonlinear
//! least squares and decide, with one acceptance predicate, whether the fit is
//! usable. Both physical models go through [`fit_window`]; only the points,
//! parameter specs and criteria differ.
//!
//! Key behaviors
//! -------------
//! - [`CurveFit`] implements [`Objective`] with cost `½·mean(r²)` and an
//!   analytic gradient built from the model Jacobian and the bound transforms.
//! - [`fit_window`] checks the point count, runs [`minimize`], and applies the
//!   acceptance criteria in order: convergence, bounds, relative error.
//! - The outcome is a tagged [`FitOutcome`]; nothing here is fatal.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters are searched in unconstrained space through [`ParamBounds`],
//!   so every trial value the model sees lies strictly inside its bounds.
//! - Standard errors come from the Gauss–Newton information at the estimate
//!   (see [`least_squares_standard_errors`]).
use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::{
    inference::least_squares_standard_errors,
    optimization::{
        errors::{OptError, OptResult},
        least_squares::{minimize, Cost, FitOptions, Grad, Objective, SolverKind, Theta},
        numerical_stability::ParamBounds,
    },
    partition::{errors::RejectionReason, models::CurveModel, options::AcceptanceCriteria},
};

/// One observation inside a fitting window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitPoint {
    pub x: f64,
    pub y: f64,
}

/// Name, admissible interval and starting value of one free parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub bounds: ParamBounds,
    pub initial: f64,
}

/// Estimated parameter with its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamEstimate {
    pub name: &'static str,
    pub value: f64,
    pub std_error: f64,
}

impl ParamEstimate {
    /// `std_error / |value|`; infinite for a zero estimate.
    pub fn relative_error(&self) -> f64 {
        if self.value == 0.0 {
            f64::INFINITY
        } else {
            self.std_error / self.value.abs()
        }
    }
}

/// An accepted window fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub estimates: Vec<ParamEstimate>,
    pub n_points: usize,
    /// Calendar days the window covers after clipping at the series edges.
    pub window_days: usize,
    pub iterations: usize,
    pub rmse: f64,
    pub converged: bool,
    pub solver: SolverKind,
}

impl FitResult {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.estimates.iter().find(|e| e.name == name).map(|e| e.value)
    }

    pub fn values(&self) -> Vec<f64> {
        self.estimates.iter().map(|e| e.value).collect()
    }
}

/// A rejected window fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    pub window_days: usize,
    pub n_points: usize,
}

/// Tagged result of a single window fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum FitOutcome {
    Accepted(FitResult),
    Rejected(Rejection),
}

impl FitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FitOutcome::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&FitResult> {
        match self {
            FitOutcome::Accepted(fit) => Some(fit),
            FitOutcome::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            FitOutcome::Accepted(_) => None,
            FitOutcome::Rejected(r) => Some(&r.reason),
        }
    }

    pub(crate) fn reject(reason: RejectionReason, window_days: usize, n_points: usize) -> Self {
        FitOutcome::Rejected(Rejection { reason, window_days, n_points })
    }
}

/// Bounded least-squares objective for a [`CurveModel`].
///
/// `θ_j` is unconstrained; the model sees `v_j = specs[j].bounds.to_model(θ_j)`.
pub struct CurveFit<'m, M: CurveModel + ?Sized> {
    pub model: &'m M,
    pub specs: &'m [ParamSpec],
}

impl<'m, M: CurveModel + ?Sized> CurveFit<'m, M> {
    pub fn new(model: &'m M, specs: &'m [ParamSpec]) -> Self {
        Self { model, specs }
    }

    /// Map unconstrained `θ` to model parameters.
    pub fn to_model(&self, theta: &Theta) -> Vec<f64> {
        self.specs.iter().zip(theta.iter()).map(|(s, &t)| s.bounds.to_model(t)).collect()
    }

    /// Starting point in unconstrained space.
    pub fn theta0(&self) -> Theta {
        self.specs.iter().map(|s| s.bounds.to_unconstrained(s.initial)).collect()
    }

    fn residuals(&self, params: &[f64], data: &[FitPoint]) -> Array1<f64> {
        data.iter().map(|p| self.model.predict(p.x, params) - p.y).collect()
    }
}

impl<'m, M: CurveModel + ?Sized> Objective for CurveFit<'m, M> {
    type Data = [FitPoint];

    fn value(&self, theta: &Theta, data: &[FitPoint]) -> OptResult<Cost> {
        let params = self.to_model(theta);
        let r = self.residuals(&params, data);
        Ok(0.5 * r.dot(&r) / data.len() as f64)
    }

    fn check(&self, theta: &Theta, data: &[FitPoint]) -> OptResult<()> {
        if data.is_empty() {
            return Err(OptError::EmptyData);
        }
        if theta.len() != self.specs.len() {
            return Err(OptError::ThetaLengthMismatch {
                expected: self.specs.len(),
                actual: theta.len(),
            });
        }
        for spec in self.specs {
            spec.bounds.validate()?;
        }
        Ok(())
    }

    /// `∂c/∂θ_j = mean_i(r_i · ∂f_i/∂v_j) · dv_j/dθ_j`.
    fn grad(&self, theta: &Theta, data: &[FitPoint]) -> OptResult<Grad> {
        let params = self.to_model(theta);
        let mut g = Array1::<f64>::zeros(theta.len());
        for p in data {
            let r = self.model.predict(p.x, &params) - p.y;
            for (j, d) in self.model.jacobian_row(p.x, &params).into_iter().enumerate() {
                g[j] += r * d;
            }
        }
        let n = data.len() as f64;
        for (j, spec) in self.specs.iter().enumerate() {
            g[j] *= spec.bounds.derivative(theta[j]) / n;
        }
        Ok(g)
    }
}

/// Fit `model` to `points` and apply `criteria`.
///
/// `window_days` is the number of calendar days `points` were drawn from;
/// it is only recorded in the outcome.
///
/// Acceptance, in order:
/// 1. `points.len() >= min_points`, else `InsufficientData`;
/// 2. the optimizer converged, else `ConvergenceFailure`;
/// 3. every value strictly inside and not near its bounds, else `ParameterOutOfBounds`;
/// 4. every relative standard error `<= max_relative_error`, else `ExcessiveUncertainty`.
pub fn fit_window<M: CurveModel + ?Sized>(
    model: &M, specs: &[ParamSpec], points: &[FitPoint], window_days: usize,
    criteria: &AcceptanceCriteria, opts: &FitOptions,
) -> FitOutcome {
    let n_points = points.len();
    if n_points < criteria.min_points {
        return FitOutcome::reject(
            RejectionReason::InsufficientData { available: n_points, required: criteria.min_points },
            window_days,
            n_points,
        );
    }

    let objective = CurveFit::new(model, specs);
    let outcome = match minimize(&objective, objective.theta0(), points, opts) {
        Ok(outcome) => outcome,
        Err(err) => {
            return FitOutcome::reject(
                RejectionReason::ConvergenceFailure { status: err.to_string() },
                window_days,
                n_points,
            )
        }
    };
    if !outcome.converged {
        return FitOutcome::reject(
            RejectionReason::ConvergenceFailure { status: outcome.status },
            window_days,
            n_points,
        );
    }

    let params = objective.to_model(&outcome.theta_hat);
    for (spec, &value) in specs.iter().zip(&params) {
        if spec.bounds.excludes(value) || spec.bounds.is_near_bound(value, criteria.boundary_rtol) {
            return FitOutcome::reject(
                RejectionReason::ParameterOutOfBounds {
                    parameter: spec.name,
                    value,
                    lower: spec.bounds.lower,
                    upper: spec.bounds.upper,
                },
                window_days,
                n_points,
            );
        }
    }

    let residuals = objective.residuals(&params, points);
    let std_errors = match standard_errors(model, &params, points, &residuals) {
        Ok(se) => se,
        Err(err) => {
            return FitOutcome::reject(
                RejectionReason::ConvergenceFailure { status: err.to_string() },
                window_days,
                n_points,
            )
        }
    };

    let estimates: Vec<ParamEstimate> = specs
        .iter()
        .zip(params.iter().zip(std_errors.iter()))
        .map(|(spec, (&value, &std_error))| ParamEstimate { name: spec.name, value, std_error })
        .collect();
    for est in &estimates {
        let relative_error = est.relative_error();
        if !(relative_error <= criteria.max_relative_error) {
            return FitOutcome::reject(
                RejectionReason::ExcessiveUncertainty {
                    parameter: est.name,
                    relative_error,
                    limit: criteria.max_relative_error,
                },
                window_days,
                n_points,
            );
        }
    }

    FitOutcome::Accepted(FitResult {
        estimates,
        n_points,
        window_days,
        iterations: outcome.iterations,
        rmse: (residuals.dot(&residuals) / n_points as f64).sqrt(),
        converged: true,
        solver: outcome.solver,
    })
}

fn standard_errors<M: CurveModel + ?Sized>(
    model: &M, params: &[f64], points: &[FitPoint], residuals: &Array1<f64>,
) -> OptResult<Array1<f64>> {
    let mut jac = Array2::<f64>::zeros((points.len(), params.len()));
    for (i, p) in points.iter().enumerate() {
        for (j, d) in model.jacobian_row(p.x, params).into_iter().enumerate() {
            jac[[i, j]] = d;
        }
    }
    least_squares_standard_errors(&jac, residuals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::least_squares::{LineSearcher, Tolerances};
    use crate::partition::models::{lloyd_taylor, HyperbolicLightResponse, LloydTaylor};

    fn lt_specs() -> [ParamSpec; 2] {
        [
            ParamSpec { name: "E0", bounds: ParamBounds { lower: 0.0, upper: 450.0 }, initial: 150.0 },
            ParamSpec { name: "R10", bounds: ParamBounds { lower: 0.0, upper: 50.0 }, initial: 1.0 },
        ]
    }

    // Deterministic ±amp perturbation so fits have non-zero residual variance.
    fn wiggle(i: usize, amp: f64) -> f64 {
        if i % 2 == 0 {
            amp
        } else {
            -amp
        }
    }

    fn respiration_points(n: usize, e0: f64, r10: f64, amp: f64) -> Vec<FitPoint> {
        (0..n)
            .map(|i| {
                let t = 273.15 + 20.0 * i as f64 / (n - 1) as f64;
                FitPoint { x: t, y: lloyd_taylor(t, e0, r10) + wiggle(i, amp) }
            })
            .collect()
    }

    #[test]
    // Purpose
    // -------
    // The analytic objective gradient matches a central difference of the cost.
    fn curve_fit_gradient_matches_finite_difference() {
        let specs = lt_specs();
        let model = LloydTaylor::joint();
        let obj = CurveFit::new(&model, &specs);
        let data = respiration_points(30, 90.0, 2.5, 0.1);
        let theta = ndarray::array![-1.0, -2.5];

        let g = obj.grad(&theta, &data).unwrap();

        let h = 1e-6;
        for j in 0..2 {
            let mut tp = theta.clone();
            let mut tm = theta.clone();
            tp[j] += h;
            tm[j] -= h;
            let fd = (obj.value(&tp, &data).unwrap() - obj.value(&tm, &data).unwrap()) / (2.0 * h);
            assert!((g[j] - fd).abs() < 1e-6 * (1.0 + fd.abs()), "j={j}: {} vs {fd}", g[j]);
        }
    }

    #[test]
    // Purpose
    // -------
    // A clean respiration window is accepted and recovers (E0, R10).
    //
    // Given
    // -----
    // - 60 points from E0 = 80, R10 = 2 over 0–20 °C with ±0.02 perturbation.
    //
    // Expect
    // ------
    // - Accepted; E0 within 5% and R10 within 2%; finite standard errors.
    fn fit_window_recovers_lloyd_taylor_parameters() {
        let data = respiration_points(60, 80.0, 2.0, 0.02);

        let outcome = fit_window(
            &LloydTaylor::joint(),
            &lt_specs(),
            &data,
            15,
            &AcceptanceCriteria::default(),
            &FitOptions::default(),
        );

        let fit = outcome.accepted().unwrap_or_else(|| panic!("rejected: {outcome:?}"));
        let e0 = fit.value("E0").unwrap();
        let r10 = fit.value("R10").unwrap();
        assert!((e0 - 80.0).abs() < 4.0, "E0 = {e0}");
        assert!((r10 - 2.0).abs() < 0.04, "R10 = {r10}");
        assert!(fit.estimates.iter().all(|e| e.std_error.is_finite() && e.std_error > 0.0));
        assert_eq!(fit.window_days, 15);
        assert_eq!(fit.n_points, 60);
    }

    #[test]
    fn fit_window_rejects_short_windows() {
        let data = respiration_points(5, 80.0, 2.0, 0.0);

        let outcome = fit_window(
            &LloydTaylor::joint(),
            &lt_specs(),
            &data,
            5,
            &AcceptanceCriteria::default(),
            &FitOptions::default(),
        );

        assert_eq!(
            outcome.rejection(),
            Some(&RejectionReason::InsufficientData { available: 5, required: 20 })
        );
    }

    #[test]
    // Purpose
    // -------
    // Pure noise around a flat line leaves E0 poorly determined.
    //
    // Given
    // -----
    // - y alternating 1 ± 0.8 over 0–20 °C (no temperature signal).
    //
    // Expect
    // ------
    // - Rejected, for bounds or uncertainty, never accepted.
    fn fit_window_rejects_unidentified_sensitivity() {
        let data: Vec<FitPoint> = (0..40)
            .map(|i| FitPoint { x: 273.15 + i as f64 * 0.5, y: 1.0 + wiggle(i / 3, 0.8) })
            .collect();

        let outcome = fit_window(
            &LloydTaylor::joint(),
            &lt_specs(),
            &data,
            15,
            &AcceptanceCriteria { max_relative_error: 0.05, ..Default::default() },
            &FitOptions::default(),
        );

        assert!(!outcome.is_accepted(), "{outcome:?}");
    }

    #[test]
    // Purpose
    // -------
    // A sensitivity beyond the admissible interval is rejected at the bound
    // it runs into.
    //
    // Given
    // -----
    // - 60 clean points from E0 = 700 with E0 bounded by (0, 450).
    //
    // Expect
    // ------
    // - `ParameterOutOfBounds` for E0 with a value next to 450.
    fn fit_window_rejects_estimate_at_upper_bound() {
        let data = respiration_points(60, 700.0, 2.0, 0.02);

        let outcome = fit_window(
            &LloydTaylor::joint(),
            &lt_specs(),
            &data,
            15,
            &AcceptanceCriteria::default(),
            &FitOptions::default(),
        );

        match outcome.rejection() {
            Some(RejectionReason::ParameterOutOfBounds { parameter: "E0", value, upper, .. }) => {
                assert_eq!(*upper, 450.0);
                assert!(*value > 445.0 && *value < 450.0, "E0 = {value}");
            }
            other => panic!("expected E0 out of bounds, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Uptake-only night data drives the reference rate onto its zero bound.
    //
    // Given
    // -----
    // - 40 points with NEE = −1 ± 0.1 over 0–20 °C.
    //
    // Expect
    // ------
    // - `ParameterOutOfBounds` for R10 with a value numerically at zero.
    fn fit_window_rejects_rate_at_lower_bound() {
        let data: Vec<FitPoint> = (0..40)
            .map(|i| FitPoint { x: 273.15 + 0.5 * i as f64, y: -1.0 + wiggle(i, 0.1) })
            .collect();

        let outcome = fit_window(
            &LloydTaylor::joint(),
            &lt_specs(),
            &data,
            15,
            &AcceptanceCriteria::default(),
            &FitOptions::default(),
        );

        match outcome.rejection() {
            Some(RejectionReason::ParameterOutOfBounds { parameter: "R10", value, lower, .. }) => {
                assert_eq!(*lower, 0.0);
                assert!(*value >= 0.0 && *value < 1e-8, "R10 = {value}");
            }
            other => panic!("expected R10 out of bounds, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // The relative-error rule rejects a converged, in-bounds fit whose
    // standard error exceeds the limit.
    //
    // Given
    // -----
    // - The clean window of `fit_window_recovers_lloyd_taylor_parameters`
    //   with `max_relative_error` tightened to 1e-6.
    //
    // Expect
    // ------
    // - `ExcessiveUncertainty` reported for E0, the first parameter, with a
    //   finite relative error above the limit.
    fn fit_window_rejects_excessive_uncertainty() {
        let data = respiration_points(60, 80.0, 2.0, 0.02);

        let outcome = fit_window(
            &LloydTaylor::joint(),
            &lt_specs(),
            &data,
            15,
            &AcceptanceCriteria { max_relative_error: 1e-6, ..Default::default() },
            &FitOptions::default(),
        );

        match outcome.rejection() {
            Some(RejectionReason::ExcessiveUncertainty { parameter: "E0", relative_error, limit }) => {
                assert_eq!(*limit, 1e-6);
                assert!(relative_error.is_finite() && *relative_error > 1e-6);
            }
            other => panic!("expected excessive uncertainty, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // An iteration cap without the simplex fallback surfaces as a
    // convergence failure.
    //
    // Given
    // -----
    // - A clean window started far from the optimum; L-BFGS capped at one
    //   iteration and `nelder_mead_fallback` disabled.
    //
    // Expect
    // ------
    // - `ConvergenceFailure` carrying the solver's termination status.
    fn fit_window_rejects_unconverged_fit() {
        let data = respiration_points(60, 80.0, 2.0, 0.02);
        let specs = [
            ParamSpec { name: "E0", bounds: ParamBounds { lower: 0.0, upper: 450.0 }, initial: 400.0 },
            ParamSpec { name: "R10", bounds: ParamBounds { lower: 0.0, upper: 50.0 }, initial: 30.0 },
        ];
        let tols = Tolerances::new(Some(1e-9), Some(1e-12), Some(1)).unwrap();
        let opts = FitOptions::new(tols, LineSearcher::MoreThuente, None).unwrap().with_fallback(false);

        let outcome =
            fit_window(&LloydTaylor::joint(), &specs, &data, 15, &AcceptanceCriteria::default(), &opts);

        match outcome.rejection() {
            Some(RejectionReason::ConvergenceFailure { status }) => assert!(!status.is_empty()),
            other => panic!("expected convergence failure, got {other:?}"),
        }
    }

    #[test]
    fn curve_fit_rejects_start_of_wrong_length() {
        let specs = lt_specs();
        let model = LloydTaylor::joint();
        let obj = CurveFit::new(&model, &specs);
        let data = respiration_points(30, 80.0, 2.0, 0.02);

        let err = minimize(&obj, ndarray::array![0.0], data.as_slice(), &FitOptions::default()).unwrap_err();

        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 2, actual: 1 });
    }

    #[test]
    // Purpose
    // -------
    // The same engine fits the light-response curve.
    fn fit_window_recovers_light_response() {
        let specs = [
            ParamSpec { name: "alpha", bounds: ParamBounds { lower: 0.0, upper: 0.5 }, initial: 0.02 },
            ParamSpec { name: "GPmax", bounds: ParamBounds { lower: 0.0, upper: 150.0 }, initial: 10.0 },
        ];
        let data: Vec<FitPoint> = (0..80)
            .map(|i| {
                let p = 20.0 + 20.0 * i as f64;
                FitPoint { x: p, y: crate::partition::models::light_response(p, 0.05, 20.0) + wiggle(i, 0.1) }
            })
            .collect();

        let outcome = fit_window(
            &HyperbolicLightResponse,
            &specs,
            &data,
            5,
            &AcceptanceCriteria::default(),
            &FitOptions::default(),
        );

        let fit = outcome.accepted().unwrap_or_else(|| panic!("rejected: {outcome:?}"));
        assert!((fit.value("alpha").unwrap() - 0.05).abs() < 0.005);
        assert!((fit.value("GPmax").unwrap() - 20.0).abs() < 1.0);
    }

    #[test]
    fn relative_error_of_zero_estimate_is_infinite() {
        let e = ParamEstimate { name: "x", value: 0.0, std_error: 1.0 };
        assert!(e.relative_error().is_infinite());
    }
}

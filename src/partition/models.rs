//! Physical curve models used by the partitioning pipeline.
//!
//! - **Lloyd–Taylor respiration** (Lloyd & Taylor 1994):
//!   `R(T) = R10 · exp[E0 · (1/(TREF − T0) − 1/(T − T0))]`, `T` in kelvin.
//! - **Hyperbolic light response** (Lasslop et al. 2008):
//!   `GPP(P) = α·P·GPmax / (α·P + GPmax)`, `P` = PPFD in µmol m⁻² s⁻¹.
//!
//! Both are exposed through [`CurveModel`], the single-predictor interface
//! consumed by the windowed-fit engine in [`fit`](super::fit).
use finitediff::FiniteDiff;

/// Temperature (K) at which Lloyd–Taylor respiration diverges to zero.
pub const T0: f64 = 227.13;

/// Reference temperature (K) at which `R = R10` (10 °C).
pub const TREF: f64 = 283.15;

/// `TREF − T0` (56.02 K).
const TREF_MINUS_T0: f64 = TREF - T0;

/// Lloyd–Taylor respiration at `temperature` (K).
///
/// Callers must ensure `temperature > T0`; at or below `T0` the expression is
/// undefined and this returns a non-finite or meaningless value.
pub fn lloyd_taylor(temperature: f64, e0: f64, r10: f64) -> f64 {
    r10 * (e0 * arrhenius_term(temperature)).exp()
}

/// `1/(TREF − T0) − 1/(T − T0)`; zero at `TREF`.
pub fn arrhenius_term(temperature: f64) -> f64 {
    1.0 / TREF_MINUS_T0 - 1.0 / (temperature - T0)
}

/// Hyperbolic light response; exactly `0` for `ppfd <= 0`.
pub fn light_response(ppfd: f64, alpha: f64, gp_max: f64) -> f64 {
    if ppfd <= 0.0 {
        return 0.0;
    }
    let ap = alpha * ppfd;
    ap * gp_max / (ap + gp_max)
}

/// Single-predictor curve `y = f(x; p)` with named parameters.
///
/// `jacobian_row` defaults to a central finite difference of `predict`;
/// models with closed-form derivatives override it.
pub trait CurveModel: Sync {
    /// Names of the free parameters, in the order of `params`.
    fn parameter_names(&self) -> &'static [&'static str];

    fn predict(&self, x: f64, params: &[f64]) -> f64;

    /// `∂f(x; p)/∂p_j` for each free parameter.
    fn jacobian_row(&self, x: f64, params: &[f64]) -> Vec<f64> {
        params.to_vec().central_diff(&|p: &Vec<f64>| self.predict(x, p))
    }
}

/// Lloyd–Taylor respiration as a curve in temperature.
///
/// With `fixed_e0 = None` the free parameters are `[E0, R10]`; with
/// `Some(e0)` only `[R10]` is free.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LloydTaylor {
    pub fixed_e0: Option<f64>,
}

impl LloydTaylor {
    pub fn joint() -> Self {
        Self { fixed_e0: None }
    }

    pub fn with_fixed_e0(e0: f64) -> Self {
        Self { fixed_e0: Some(e0) }
    }

    fn unpack(&self, params: &[f64]) -> (f64, f64) {
        match self.fixed_e0 {
            Some(e0) => (e0, params[0]),
            None => (params[0], params[1]),
        }
    }
}

impl CurveModel for LloydTaylor {
    fn parameter_names(&self) -> &'static [&'static str] {
        match self.fixed_e0 {
            Some(_) => &["R10"],
            None => &["E0", "R10"],
        }
    }

    fn predict(&self, temperature: f64, params: &[f64]) -> f64 {
        let (e0, r10) = self.unpack(params);
        lloyd_taylor(temperature, e0, r10)
    }

    fn jacobian_row(&self, temperature: f64, params: &[f64]) -> Vec<f64> {
        let (e0, r10) = self.unpack(params);
        let g = arrhenius_term(temperature);
        let d_r10 = (e0 * g).exp();
        match self.fixed_e0 {
            Some(_) => vec![d_r10],
            None => vec![r10 * d_r10 * g, d_r10],
        }
    }
}

/// Hyperbolic light response as a curve in PPFD; parameters `[alpha, GPmax]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HyperbolicLightResponse;

impl CurveModel for HyperbolicLightResponse {
    fn parameter_names(&self) -> &'static [&'static str] {
        &["alpha", "GPmax"]
    }

    fn predict(&self, ppfd: f64, params: &[f64]) -> f64 {
        light_response(ppfd, params[0], params[1])
    }

    fn jacobian_row(&self, ppfd: f64, params: &[f64]) -> Vec<f64> {
        let (alpha, gp_max) = (params[0], params[1]);
        if ppfd <= 0.0 {
            return vec![0.0, 0.0];
        }
        let ap = alpha * ppfd;
        let denom = (ap + gp_max).powi(2);
        vec![ppfd * gp_max * gp_max / denom, ap * ap / denom]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Uses the default finite-difference Jacobian.
    struct NumericLloydTaylor;

    impl CurveModel for NumericLloydTaylor {
        fn parameter_names(&self) -> &'static [&'static str] {
            &["E0", "R10"]
        }

        fn predict(&self, x: f64, params: &[f64]) -> f64 {
            lloyd_taylor(x, params[0], params[1])
        }
    }

    #[test]
    // Purpose
    // -------
    // R equals R10 at the reference temperature and grows with temperature.
    fn lloyd_taylor_reference_point_and_monotonicity() {
        assert!((lloyd_taylor(TREF, 80.0, 2.0) - 2.0).abs() < 1e-12);
        assert!(lloyd_taylor(TREF + 10.0, 80.0, 2.0) > 2.0);
        assert!(lloyd_taylor(TREF - 10.0, 80.0, 2.0) < 2.0);
        assert!(lloyd_taylor(T0 + 1.0, 80.0, 2.0) >= 0.0);
    }

    #[test]
    // Purpose
    // -------
    // GPP is exactly zero without light and saturates at GPmax.
    fn light_response_zero_and_saturation() {
        assert_eq!(light_response(0.0, 0.05, 20.0), 0.0);
        assert_eq!(light_response(-3.0, 0.05, 20.0), 0.0);
        assert!((light_response(1e9, 0.05, 20.0) - 20.0).abs() < 1e-5);
        // α·P = GPmax gives half saturation.
        assert!((light_response(400.0, 0.05, 20.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Analytic Jacobians agree with the finite-difference default.
    fn analytic_jacobians_match_finite_differences() {
        let lt = LloydTaylor::joint();
        for &t in &[270.0, 283.15, 300.0] {
            let analytic = lt.jacobian_row(t, &[80.0, 2.0]);
            let numeric = NumericLloydTaylor.jacobian_row(t, &[80.0, 2.0]);
            for (a, n) in analytic.iter().zip(&numeric) {
                assert!((a - n).abs() < 1e-6 * (1.0 + a.abs()), "T={t}: {a} vs {n}");
            }
        }

        let lr = HyperbolicLightResponse;
        let p = [0.05, 20.0];
        let h = 1e-7;
        for &ppfd in &[50.0, 400.0, 1500.0] {
            let row = lr.jacobian_row(ppfd, &p);
            let fd_alpha = (lr.predict(ppfd, &[p[0] + h, p[1]]) - lr.predict(ppfd, &[p[0] - h, p[1]]))
                / (2.0 * h);
            let fd_gmax = (lr.predict(ppfd, &[p[0], p[1] + h]) - lr.predict(ppfd, &[p[0], p[1] - h]))
                / (2.0 * h);
            assert!((row[0] - fd_alpha).abs() < 1e-4 * (1.0 + fd_alpha.abs()));
            assert!((row[1] - fd_gmax).abs() < 1e-5);
        }
    }

    #[test]
    fn fixed_e0_model_has_single_parameter() {
        let m = LloydTaylor::with_fixed_e0(80.0);
        assert_eq!(m.parameter_names(), &["R10"]);
        assert!((m.predict(TREF, &[1.5]) - 1.5).abs() < 1e-12);
        assert_eq!(m.jacobian_row(TREF, &[1.5]).len(), 1);
    }
}

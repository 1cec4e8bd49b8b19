//! optimization::errors — unified error surface for the curve-fitting optimizer.
//!
//! Purpose
//! -------
//! Collect every failure the optimization layer can produce (configuration
//! mistakes, non-finite objective values, gradient/parameter validation and
//! argmin backend failures) into a single enum, [`OptError`], with the
//! [`OptResult`] alias used by all fallible optimizer entry points.
//!
//! Conventions
//! -----------
//! - argmin reports failures as an opaque `argmin::core::Error`. The
//!   `From<Error>` conversion first recovers our own [`OptError`] (raised from
//!   inside a cost or gradient closure), then typed [`ArgminError`] variants,
//!   and only falls back to [`OptError::BackendError`] with the rendered text.
//! - Errors are small and `Clone` so that window-level rejection records can
//!   keep them verbatim.
use argmin::core::{ArgminError, Error};
use thiserror::Error;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptError {
    // ---- Gradient ----
    /// Objective does not provide an analytic gradient; finite differences are used.
    #[error("Analytic gradient not implemented")]
    GradientNotImplemented,

    #[error("Gradient dimension mismatch: expected {expected}, found {found}")]
    GradientDimMismatch { expected: usize, found: usize },

    #[error("Invalid gradient at index {index}: {value}: {reason}")]
    InvalidGradient { index: usize, value: f64, reason: &'static str },

    // ---- FitOptions ----
    #[error("Invalid gradient tolerance {tol}: {reason}")]
    InvalidTolGrad { tol: f64, reason: &'static str },

    #[error("Invalid cost change tolerance {tol}: {reason}")]
    InvalidTolCost { tol: f64, reason: &'static str },

    #[error("Invalid maximum iterations {max_iter}: {reason}")]
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    #[error("No tolerances provided")]
    NoTolerancesProvided,

    #[error("Invalid line searcher '{name}': {reason}")]
    InvalidLineSearch { name: String, reason: &'static str },

    #[error("Invalid L-BFGS memory {mem}: {reason}")]
    InvalidLBFGSMem { mem: usize, reason: &'static str },

    // ---- Parameters ----
    #[error("Invalid parameter bounds [{lower}, {upper}]: {reason}")]
    InvalidBounds { lower: f64, upper: f64, reason: &'static str },

    #[error("Theta length mismatch: expected {expected}, actual {actual}")]
    ThetaLengthMismatch { expected: usize, actual: usize },

    #[error("Invalid theta input at index {index}: {value}, must be finite")]
    InvalidThetaInput { index: usize, value: f64 },

    // ---- Objective ----
    #[error("Non-finite cost value: {value}")]
    NonFiniteCost { value: f64 },

    #[error("Objective needs at least one data point")]
    EmptyData,

    // ---- Optimizer outcome ----
    #[error("Invalid estimated parameter at index {index}: {value}: {reason}")]
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    #[error("Missing estimated parameters (theta hat)")]
    MissingThetaHat,

    // ---- Argmin ----
    #[error("Invalid parameter: {text}")]
    InvalidParameter { text: String },

    #[error("Not implemented: {text}")]
    NotImplemented { text: String },

    #[error("Not initialized: {text}")]
    NotInitialized { text: String },

    #[error("Condition violated: {text}")]
    ConditionViolated { text: String },

    #[error("Checkpoint not found: {text}")]
    CheckPointNotFound { text: String },

    #[error("Potential bug: {text}")]
    PotentialBug { text: String },

    #[error("Impossible error: {text}")]
    ImpossibleError { text: String },

    #[error("Backend error: {text}")]
    BackendError { text: String },

    // ---- Information matrix ----
    #[error("Information matrix dimension mismatch: expected ({expected}, {expected}), found {found:?}")]
    InformationDimMismatch { expected: usize, found: (usize, usize) },

    #[error("Invalid information matrix entry at ({row}, {col}): {value}, must be finite")]
    InvalidInformation { row: usize, col: usize, value: f64 },

    #[error("Jacobian has {rows} rows but {residuals} residuals were supplied")]
    JacobianDimMismatch { rows: usize, residuals: usize },
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                other => OptError::BackendError { text: other.to_string() },
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

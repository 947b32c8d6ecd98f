//! Model error types.

use pricer_core::math::LinalgError;
use pricer_core::types::PricingError;
use thiserror::Error;

/// Errors raised while constructing stochastic processes and market models.
///
/// All of these are precondition violations: they are returned from
/// constructors and never produced while a simulation is running.
///
/// # Examples
/// ```
/// use pricer_models::models::ModelError;
///
/// let err = ModelError::InvalidParameter { name: "volatility", value: -0.2 };
/// assert_eq!(format!("{}", err), "Invalid parameter volatility = -0.2");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A scalar model parameter is out of range.
    #[error("Invalid parameter {name} = {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Vector inputs disagree in length.
    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which input
        what: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// Structural precondition violated (index ordering, time ordering).
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// Covariance factorisation failed.
    #[error("Linear algebra failure: {0}")]
    Linalg(#[from] LinalgError),
}

impl From<ModelError> for PricingError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Linalg(e) => PricingError::NumericalInstability(e.to_string()),
            other => PricingError::InvalidInput(other.to_string()),
        }
    }
}

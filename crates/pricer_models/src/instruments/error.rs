//! Instrument error types.

use pricer_core::types::PricingError;
use thiserror::Error;

/// Instrument construction errors.
///
/// # Examples
/// ```
/// use pricer_models::instruments::InstrumentError;
///
/// let err = InstrumentError::InvalidStrike { strike: -100.0 };
/// assert!(format!("{}", err).contains("-100"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstrumentError {
    /// Invalid strike price (negative or not finite).
    #[error("Invalid strike: K = {strike}")]
    InvalidStrike {
        /// The invalid strike value
        strike: f64,
    },

    /// A schedule of dates was empty.
    #[error("Empty schedule: {0}")]
    EmptySchedule(&'static str),

    /// A schedule of dates was not strictly increasing.
    #[error("Schedule not strictly increasing: {0}")]
    UnsortedSchedule(&'static str),

    /// General parameter validation failure.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

impl From<InstrumentError> for PricingError {
    fn from(err: InstrumentError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = InstrumentError::InvalidParameter {
            name: "moneyness",
            reason: "must be positive".into(),
        };
        assert_eq!(err.to_string(), "Invalid parameter moneyness: must be positive");
        assert_eq!(
            InstrumentError::EmptySchedule("fixing dates").to_string(),
            "Empty schedule: fixing dates"
        );
    }
}

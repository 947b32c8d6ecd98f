//! Market data error types.

use crate::types::PricingError;
use thiserror::Error;

/// Market data operation errors.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::MarketDataError;
///
/// let err = MarketDataError::InvalidMaturity { t: -1.0 };
/// assert!(format!("{}", err).contains("-1"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Invalid maturity (negative time or empty period).
    #[error("Invalid maturity: t = {t}")]
    InvalidMaturity {
        /// The invalid maturity value
        t: f64,
    },
}

impl From<MarketDataError> for PricingError {
    fn from(err: MarketDataError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_maturity_display() {
        let err = MarketDataError::InvalidMaturity { t: -1.5 };
        assert_eq!(format!("{}", err), "Invalid maturity: t = -1.5");
    }

    #[test]
    fn test_into_pricing_error() {
        let pricing_err: PricingError = MarketDataError::InvalidMaturity { t: f64::NAN }.into();
        assert_eq!(
            pricing_err,
            PricingError::InvalidInput("Invalid maturity: t = NaN".to_string())
        );
    }
}

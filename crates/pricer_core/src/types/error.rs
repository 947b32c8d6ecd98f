//! Error types for structured error handling.
//!
//! This module provides:
//! - `PricingError`: Errors surfaced by pricing facades
//! - `DateError`: Errors from date construction and parsing

use thiserror::Error;

/// Categorised pricing errors.
///
/// The taxonomy mirrors how failures propagate out of the Monte Carlo core:
/// malformed input fails fast, numerical degeneracy is handled locally and
/// only escapes when no fallback exists, and non-convergence is surfaced
/// explicitly.
///
/// # Examples
/// ```
/// use pricer_core::types::PricingError;
///
/// let err = PricingError::InvalidInput("negative spot".to_string());
/// assert_eq!(format!("{}", err), "Invalid input: negative spot");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Invalid input data or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Numerical instability during computation
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Instrument type not supported by the engine
    #[error("Unsupported instrument: {0}")]
    UnsupportedInstrument(String),
}

/// Date-related errors.
///
/// # Examples
/// ```
/// use pricer_core::types::DateError;
///
/// let err = DateError::InvalidDate { year: 2024, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "Invalid date: 2024-2-30");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// Invalid date components (e.g., February 30th).
    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Failed to parse date string.
    #[error("Date parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_error_display() {
        assert_eq!(
            PricingError::NumericalInstability("singular basis".into()).to_string(),
            "Numerical instability: singular basis"
        );
        assert_eq!(
            PricingError::UnsupportedInstrument("digital".into()).to_string(),
            "Unsupported instrument: digital"
        );
    }

    #[test]
    fn test_date_error_display() {
        let err = DateError::ParseError("2024-13-01".into());
        assert_eq!(err.to_string(), "Date parse error: 2024-13-01");
    }
}

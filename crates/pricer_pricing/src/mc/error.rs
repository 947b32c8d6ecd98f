//! Error types for the Monte Carlo core.
//!
//! - [`ConfigError`]: invalid simulation or regression settings, raised at build time
//! - [`TimeGridError`]: malformed mandatory times or off-grid lookups
//! - [`RngError`]: sequence generator misuse or exhaustion
//! - [`McError`]: everything a `calculate()` call can return

use pricer_core::market_data::MarketDataError;
use pricer_core::math::LinalgError;
use pricer_core::types::PricingError;
use pricer_models::instruments::InstrumentError;
use pricer_models::models::ModelError;
use thiserror::Error;

/// Configuration error for Monte Carlo and Longstaff-Schwartz settings.
///
/// These errors occur during construction when invalid parameters are provided.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Neither a sample count nor a tolerance was given.
    #[error("Neither required samples nor required tolerance given")]
    MissingSampleTarget,

    /// A tolerance target was combined with a low-discrepancy generator.
    #[error("Required tolerance is not supported with low-discrepancy sequences")]
    ToleranceWithLowDiscrepancy,

    /// Both `time_steps` and `time_steps_per_year` were given.
    #[error("Time steps and time steps per year are mutually exclusive")]
    ConflictingTimeSteps,

    /// The sample cap is below the requested sample count.
    #[error("Max samples {max} below required samples {required}")]
    MaxBelowRequired {
        /// Sample cap
        max: usize,
        /// Requested sample count
        required: usize,
    },

    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },
}

/// Time grid construction and lookup errors.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum TimeGridError {
    /// No mandatory times were supplied.
    #[error("Empty time sequence")]
    Empty,

    /// A mandatory time is negative.
    #[error("Negative time {0} not allowed")]
    NegativeTime(f64),

    /// A mandatory time is NaN or infinite.
    #[error("Time {0} is not finite")]
    NonFinite(f64),

    /// A regular grid needs a positive end time and step count.
    #[error("Invalid regular grid: end {end}, steps {steps}")]
    InvalidRegularGrid {
        /// End time
        end: f64,
        /// Number of steps
        steps: usize,
    },

    /// Lookup of a time that is not a grid point.
    #[error("Time {0} is not on the grid")]
    NotOnGrid(f64),
}

/// Sequence generator errors.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RngError {
    /// The low-discrepancy sequence ran past its supported period.
    #[error("Sequence period exhausted: requested point {requested}, period {period}")]
    PeriodExhausted {
        /// Index of the requested point
        requested: u64,
        /// Number of points the sequence supports
        period: u64,
    },

    /// A generator was requested with zero dimensions.
    #[error("Sequence dimension must be positive")]
    ZeroDimension,
}

/// Errors surfaced by Monte Carlo engines.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum McError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid time grid.
    #[error(transparent)]
    TimeGrid(#[from] TimeGridError),

    /// Sequence generator failure; stops the run.
    #[error(transparent)]
    Rng(#[from] RngError),

    /// Invalid process or market model.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Invalid instrument.
    #[error(transparent)]
    Instrument(#[from] InstrumentError),

    /// Discount curve failure.
    #[error(transparent)]
    MarketData(#[from] MarketDataError),

    /// Regression failure.
    #[error(transparent)]
    Linalg(#[from] LinalgError),

    /// The sample cap was reached before the tolerance was met. Carries the
    /// best-effort estimate.
    #[error(
        "Not converged after {samples} samples: value {mean}, error {error_estimate} above tolerance {tolerance}"
    )]
    NotConverged {
        /// Samples drawn
        samples: usize,
        /// Estimate at the cap
        mean: f64,
        /// Error estimate at the cap
        error_estimate: f64,
        /// Requested tolerance
        tolerance: f64,
    },

    /// Process/instrument combination the engine cannot price.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Caller input outside the engine's domain.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<McError> for PricingError {
    fn from(err: McError) -> Self {
        match err {
            McError::Model(e) => e.into(),
            McError::Instrument(e) => e.into(),
            McError::MarketData(e) => e.into(),
            McError::Linalg(e) => PricingError::NumericalInstability(e.to_string()),
            McError::NotConverged { .. } | McError::Rng(_) => {
                PricingError::NumericalInstability(err.to_string())
            }
            McError::Unsupported(msg) => PricingError::UnsupportedInstrument(msg),
            other => PricingError::InvalidInput(other.to_string()),
        }
    }
}

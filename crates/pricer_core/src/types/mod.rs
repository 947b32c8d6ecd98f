//! Core types: errors and time.
//!
//! - [`error`]: `PricingError`, `DateError`
//! - [`time`]: `Date`, `DayCountConvention`

pub mod error;
pub mod time;

pub use error::{DateError, PricingError};
pub use time::{Date, DayCountConvention};

//! Market data consumed by the pricing core.
//!
//! # Components
//!
//! - [`curves`]: Yield curve trait and the flat curve implementation
//! - [`handle`]: Versioned handles used for explicit dependency tracking
//! - [`error`]: Market data error types (MarketDataError)

pub mod curves;
pub mod error;
pub mod handle;

pub use curves::{FlatCurve, YieldCurve};
pub use error::MarketDataError;
pub use handle::Handle;

//! # pricer_core: Foundation Layer for the Monte Carlo Pricing Core
//!
//! ## Layer 1 (Foundation) Role
//!
//! pricer_core is the bottom layer of the pricing workspace, providing:
//! - Error types: `PricingError`, `DateError` (`types::error`)
//! - Time types: `Date`, `DayCountConvention` (`types::time`)
//! - Discounting: the `YieldCurve` trait and `FlatCurve` (`market_data::curves`)
//! - Versioned market data handles for explicit dependency tracking (`market_data::handle`)
//! - Dense linear algebra for regression and covariance factorisation (`math::linalg`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other pricer_* crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - nalgebra: SVD and symmetric eigen-decomposition
//! - chrono: Date arithmetic
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
//! use pricer_core::types::{Date, DayCountConvention};
//!
//! let start = Date::from_ymd(2024, 1, 1).unwrap();
//! let end = Date::from_ymd(2025, 1, 1).unwrap();
//! let t = DayCountConvention::Act365Fixed.year_fraction(start, end);
//! assert!((t - 366.0 / 365.0).abs() < 1e-12);
//!
//! let curve = FlatCurve::new(0.05_f64);
//! let df = curve.discount_factor(1.0).unwrap();
//! assert!((df - (-0.05_f64).exp()).abs() < 1e-15);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for Date and DayCountConvention

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod types;

//! Closed-form helpers consumed by the Monte Carlo core.
//!
//! These are collaborators, not products: control-variate values and test
//! benchmarks.
//!
//! - [`distributions`]: normal pdf, cdf and inverse cdf
//! - [`black`]: Black formula on forwards
//! - [`asian`]: discrete geometric-average Asian option

pub mod asian;
pub mod black;
pub mod distributions;

pub use asian::{discrete_geometric_asian, GeometricAsianInputs};
pub use black::black_formula;
pub use distributions::{inverse_norm_cdf, norm_cdf, norm_pdf};

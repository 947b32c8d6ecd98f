//! Numerical building blocks.
//!
//! - [`linalg`]: least-squares regression and covariance square roots

pub mod linalg;

pub use linalg::{least_squares, pseudo_sqrt, rank_reduced_sqrt, LinalgError};

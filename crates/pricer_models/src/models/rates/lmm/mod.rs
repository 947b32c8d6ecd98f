//! LIBOR market model.
//!
//! - [`LmmCurveState`]: forwards, discount ratios, coterminal annuities and swap rates
//! - [`LmmDriftCalculator`]: plain and factor-reduced no-arbitrage drifts
//! - [`FlatVolMarketModel`]: step covariances and pseudo-roots
//! - [`LiborMarketModelProcess`]: the model as a [`StochasticProcess`](crate::models::StochasticProcess)

mod curve_state;
mod drift;
mod market_model;
mod process;

pub use curve_state::LmmCurveState;
pub use drift::{DriftAlgorithm, LmmDriftCalculator};
pub use market_model::{
    EvolutionStep, ExponentialCorrelation, FlatVolMarketModel, LmmParameters, Measure,
};
pub use process::LiborMarketModelProcess;

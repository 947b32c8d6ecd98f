//! Monte Carlo simulation core.
//!
//! # Architecture
//!
//! ```text
//! MonteCarloSimulation        (sampling loop, stopping rules, rayon batches)
//! └── MonteCarloModel         (one batch: draw, price, accumulate)
//!     ├── PathGenerator       (process + TimeGrid + SequenceGenerator [+ BrownianBridge])
//!     ├── PathPricer          (path -> discounted payoff)
//!     ├── ControlVariate      (optional correlated payoff with known value)
//!     └── SampleAccumulator   (Statistics, ConvergenceStatistics)
//! ```
//!
//! Engines build a [`TimeGrid`] from the instrument's mandatory times and a
//! [`MonteCarloConfig`], wrap a process and a path pricer in a
//! [`MonteCarloModel`], and let [`MonteCarloSimulation`] apply the stopping
//! rule.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use pricer_models::models::BlackScholesProcess;
//! use pricer_pricing::mc::{
//!     MonteCarloConfig, MonteCarloModel, MonteCarloSimulation, MultiPath, SampleAccumulator,
//!     TimeGrid,
//! };
//!
//! let process = BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).unwrap();
//! let config = MonteCarloConfig::builder()
//!     .time_steps(4)
//!     .antithetic(true)
//!     .required_samples(20_000)
//!     .seed(42)
//!     .build()
//!     .unwrap();
//! let grid = Arc::new(TimeGrid::new(&[1.0], config.steps_for(1.0)).unwrap());
//! let put = |path: &MultiPath| (100.0 - path.value(4, 0)).max(0.0) * (-0.05_f64).exp();
//!
//! let model = MonteCarloModel::new(&process, grid, &put, config.sequence_settings());
//! let mut simulation = MonteCarloSimulation::new(model);
//! let value = simulation.value_with_samples(20_000).unwrap();
//! // Black-Scholes put: 5.5735
//! assert!((value - 5.5735).abs() < 5.0 * simulation.accumulator().error_estimate());
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod path;
pub mod path_generator;
pub mod path_pricer;
pub mod simulation;
pub mod statistics;
pub mod time_grid;

pub use config::{
    LsmConfig, LsmConfigBuilder, MonteCarloConfig, MonteCarloConfigBuilder, SequenceSettings,
    CALIBRATION_SEED_OFFSET, DEFAULT_BATCH_SIZE, MAX_SAMPLES,
};
pub use error::{ConfigError, McError, RngError, TimeGridError};
pub use model::{ControlVariate, MonteCarloModel};
pub use path::{MultiPath, Sample};
pub use path_generator::PathGenerator;
pub use path_pricer::PathPricer;
pub use simulation::{MonteCarloSimulation, MIN_SAMPLES};
pub use statistics::{ConvergenceStatistics, SampleAccumulator, Statistics};
pub use time_grid::TimeGrid;

//! Monte Carlo model: path generation plus pricing of one batch.
//!
//! The model ties a process, a time grid, a path pricer and the drawing
//! settings together and turns a batch of draws into a sample accumulator.
//! Each sample is
//!
//! ```text
//! p(x)                            plain
//! (p(x) + p(-x)) / 2              antithetic
//! p(x) + cv_value - cv(x)         with a control variate (per leg)
//! ```
//!
//! Batches are independent: batch `b` starting at sequence `offset` always
//! sees the same draws, whichever thread runs it.

use std::sync::Arc;

use pricer_models::models::StochasticProcess;

use super::config::SequenceSettings;
use super::error::McError;
use super::path::MultiPath;
use super::path_generator::PathGenerator;
use super::path_pricer::PathPricer;
use super::statistics::SampleAccumulator;
use super::time_grid::TimeGrid;

/// Control variate: a pricer of a correlated payoff with known value.
#[derive(Clone, Copy)]
pub struct ControlVariate<'a> {
    /// Path pricer of the control payoff
    pub pricer: &'a dyn PathPricer,
    /// Exact value of the control payoff
    pub value: f64,
}

/// Process, grid, pricer and drawing settings of one simulation.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use pricer_models::models::BlackScholesProcess;
/// use pricer_pricing::mc::{MonteCarloConfig, MonteCarloModel, MultiPath, SampleAccumulator, Statistics, TimeGrid};
///
/// let process = BlackScholesProcess::new(100.0, 0.0, 0.0, 0.2).unwrap();
/// let grid = Arc::new(TimeGrid::regular(1.0, 1).unwrap());
/// let terminal = |path: &MultiPath| path.value(1, 0);
/// let config = MonteCarloConfig::builder().antithetic(true).required_samples(1).build().unwrap();
///
/// let model = MonteCarloModel::new(&process, grid, &terminal, config.sequence_settings());
/// let stats: Statistics = model.run_batch(0, 0, 10_000).unwrap();
/// assert_eq!(stats.samples(), 10_000);
/// assert!((stats.mean() - 100.0).abs() < 1.0);
/// ```
pub struct MonteCarloModel<'a, P: StochasticProcess + ?Sized> {
    process: &'a P,
    grid: Arc<TimeGrid>,
    pricer: &'a dyn PathPricer,
    control_variate: Option<ControlVariate<'a>>,
    settings: SequenceSettings,
}

impl<'a, P: StochasticProcess + ?Sized> MonteCarloModel<'a, P> {
    /// Creates a model without control variate.
    pub fn new(
        process: &'a P,
        grid: Arc<TimeGrid>,
        pricer: &'a dyn PathPricer,
        settings: SequenceSettings,
    ) -> Self {
        Self {
            process,
            grid,
            pricer,
            control_variate: None,
            settings,
        }
    }

    /// Adds a control variate.
    pub fn with_control_variate(mut self, control_variate: ControlVariate<'a>) -> Self {
        self.control_variate = Some(control_variate);
        self
    }

    /// Drawing settings.
    #[inline]
    pub fn settings(&self) -> &SequenceSettings {
        &self.settings
    }

    /// Simulation grid.
    #[inline]
    pub fn time_grid(&self) -> &Arc<TimeGrid> {
        &self.grid
    }

    #[inline]
    fn price_path(&self, path: &MultiPath) -> f64 {
        let price = self.pricer.price(path);
        match &self.control_variate {
            Some(cv) => price + cv.value - cv.pricer.price(path),
            None => price,
        }
    }

    /// Draws `samples` samples of batch `batch`, starting at sequence
    /// `offset` of the run, into a fresh accumulator.
    ///
    /// # Errors
    ///
    /// Fails when the generator cannot be built or its sequence runs out.
    pub fn run_batch<S: SampleAccumulator>(
        &self,
        batch: u64,
        offset: u64,
        samples: usize,
    ) -> Result<S, McError> {
        let mut generator =
            PathGenerator::for_batch(self.process, Arc::clone(&self.grid), &self.settings, batch, offset)?;
        let mut accumulator = S::default();
        for _ in 0..samples {
            let sample = generator.next()?;
            let weight = sample.weight;
            let mut price = self.price_path(sample.value);
            if self.settings.antithetic {
                let mirror = generator.antithetic()?;
                price = 0.5 * (price + self.price_path(mirror.value));
            }
            accumulator.add(price, weight);
        }
        Ok(accumulator)
    }
}

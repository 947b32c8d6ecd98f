//! Monte Carlo simulation loop.
//!
//! [`MonteCarloSimulation`] owns the running accumulator of a
//! [`MonteCarloModel`] and adds samples in numbered batches run in parallel
//! with rayon. Batch `b` always draws the same sequences (its own
//! pseudo-random substream, or its own slice of the Halton sequence), and
//! partial accumulators are merged in batch order, so results do not depend
//! on the number of worker threads.
//!
//! Two stopping rules are provided:
//!
//! - [`value_with_samples`](MonteCarloSimulation::value_with_samples): a
//!   fixed sample count
//! - [`value`](MonteCarloSimulation::value): sample until the error
//!   estimate drops below a tolerance. Each round extrapolates the samples
//!   still needed from `order = (error / tolerance)²`, adding
//!   `max(n · order · 0.8 - n, min_samples)` samples, capped so the total
//!   never exceeds `max_samples`. Hitting the cap with the error still above
//!   tolerance is [`McError::NotConverged`].

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use pricer_models::models::StochasticProcess;

use super::config::MonteCarloConfig;
use super::error::{ConfigError, McError};
use super::model::MonteCarloModel;
use super::statistics::{SampleAccumulator, Statistics};

/// Minimum batch of samples added per round of a tolerance run.
pub const MIN_SAMPLES: usize = 1023;

/// Stateful sampling loop over a model.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use pricer_models::models::BlackScholesProcess;
/// use pricer_pricing::mc::{MonteCarloConfig, MonteCarloModel, MonteCarloSimulation, MultiPath, TimeGrid};
///
/// let process = BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).unwrap();
/// let grid = Arc::new(TimeGrid::regular(1.0, 1).unwrap());
/// let call = |path: &MultiPath| (path.value(1, 0) - 100.0).max(0.0) * (-0.05_f64).exp();
/// let config = MonteCarloConfig::builder().required_tolerance(0.05).seed(1).build().unwrap();
///
/// let model = MonteCarloModel::new(&process, grid, &call, config.sequence_settings());
/// let mut simulation = MonteCarloSimulation::new(model);
/// let value = simulation.value(0.05, config.max_samples(), 1023).unwrap();
/// assert!((value - 10.4506).abs() < 0.25);
/// ```
pub struct MonteCarloSimulation<'a, P: StochasticProcess + ?Sized, S: SampleAccumulator = Statistics> {
    model: MonteCarloModel<'a, P>,
    accumulator: S,
    next_batch: u64,
    sequences_drawn: u64,
}

impl<'a, P: StochasticProcess + ?Sized> MonteCarloSimulation<'a, P> {
    /// Creates a simulation accumulating into [`Statistics`].
    pub fn new(model: MonteCarloModel<'a, P>) -> Self {
        Self::with_accumulator(model, Statistics::default())
    }
}

impl<'a, P: StochasticProcess + ?Sized, S: SampleAccumulator> MonteCarloSimulation<'a, P, S> {
    /// Creates a simulation that adds its samples to `accumulator`.
    pub fn with_accumulator(model: MonteCarloModel<'a, P>, accumulator: S) -> Self {
        Self {
            model,
            accumulator,
            next_batch: 0,
            sequences_drawn: 0,
        }
    }

    /// The underlying model.
    #[inline]
    pub fn model(&self) -> &MonteCarloModel<'a, P> {
        &self.model
    }

    /// Samples accumulated so far.
    #[inline]
    pub fn accumulator(&self) -> &S {
        &self.accumulator
    }

    /// Adds `samples` samples, split into batches of the configured size.
    ///
    /// # Errors
    ///
    /// The first batch error in batch order; no samples are added then.
    pub fn add_samples(&mut self, samples: usize) -> Result<(), McError> {
        if samples == 0 {
            return Ok(());
        }
        let batch_size = self.model.settings().batch_size.max(1);
        let first_batch = self.next_batch;
        let first_offset = self.sequences_drawn;

        let batches: Vec<(u64, u64, usize)> = (0..samples)
            .step_by(batch_size)
            .enumerate()
            .map(|(k, start)| {
                (
                    first_batch + k as u64,
                    first_offset + start as u64,
                    batch_size.min(samples - start),
                )
            })
            .collect();

        let model = &self.model;
        let partials: Vec<Result<S, McError>> = batches
            .par_iter()
            .map(|&(batch, offset, n)| model.run_batch::<S>(batch, offset, n))
            .collect();

        let mut merged = S::default();
        for partial in partials {
            merged.merge(&partial?);
        }
        self.accumulator.merge(&merged);
        self.next_batch += batches.len() as u64;
        self.sequences_drawn += samples as u64;
        trace!(
            added = samples,
            batches = batches.len(),
            total = self.accumulator.samples(),
            "Samples added"
        );
        Ok(())
    }

    /// Mean after topping the accumulator up to `samples` samples.
    pub fn value_with_samples(&mut self, samples: usize) -> Result<f64, McError> {
        let current = self.accumulator.samples();
        if samples > current {
            self.add_samples(samples - current)?;
        }
        Ok(self.accumulator.mean())
    }

    /// Applies the stopping rule of `config`: a fixed sample count, a
    /// tolerance, or both (whichever is met first).
    ///
    /// # Errors
    ///
    /// [`McError::NotConverged`] when the sample cap stops a tolerance run.
    pub fn run(&mut self, config: &MonteCarloConfig) -> Result<f64, McError> {
        let max_samples = config.max_samples();
        match (config.required_samples(), config.required_tolerance()) {
            (Some(samples), None) => self.value_with_samples(samples),
            (None, Some(tolerance)) => self.value(tolerance, max_samples, MIN_SAMPLES),
            (Some(samples), Some(tolerance)) => {
                self.value_with_target(tolerance, samples, max_samples, MIN_SAMPLES)
            }
            (None, None) => Err(ConfigError::MissingSampleTarget.into()),
        }
    }

    /// Mean once the error estimate is at most `tolerance`.
    ///
    /// # Errors
    ///
    /// [`McError::NotConverged`] when `max_samples` samples do not reach the
    /// tolerance; the error carries the estimate at the cap.
    pub fn value(
        &mut self,
        tolerance: f64,
        max_samples: usize,
        min_samples: usize,
    ) -> Result<f64, McError> {
        self.converge(tolerance, max_samples, min_samples, None)
    }

    /// Mean once the error estimate is at most `tolerance` or `stop_at`
    /// samples have been drawn, whichever comes first.
    ///
    /// # Errors
    ///
    /// [`McError::NotConverged`] when `max_samples` is reached first.
    pub fn value_with_target(
        &mut self,
        tolerance: f64,
        stop_at: usize,
        max_samples: usize,
        min_samples: usize,
    ) -> Result<f64, McError> {
        self.converge(tolerance, max_samples, min_samples, Some(stop_at))
    }

    fn converge(
        &mut self,
        tolerance: f64,
        max_samples: usize,
        min_samples: usize,
        stop_at: Option<usize>,
    ) -> Result<f64, McError> {
        let first = min_samples.min(max_samples).min(stop_at.unwrap_or(usize::MAX));
        let mut samples = self.accumulator.samples();
        if samples < first {
            self.add_samples(first - samples)?;
            samples = self.accumulator.samples();
        }

        let mut error = self.accumulator.error_estimate();
        while error > tolerance {
            if stop_at.is_some_and(|target| samples >= target) {
                debug!(samples, error, tolerance, "Sample target reached before tolerance");
                return Ok(self.accumulator.mean());
            }
            if samples >= max_samples {
                warn!(samples, error, tolerance, "Sample cap reached above tolerance");
                return Err(McError::NotConverged {
                    samples,
                    mean: self.accumulator.mean(),
                    error_estimate: error,
                    tolerance,
                });
            }
            let order = error * error / (tolerance * tolerance);
            let grown = (samples as f64 * order * 0.8 - samples as f64).max(min_samples as f64);
            let mut next = (grown as usize).min(max_samples - samples);
            if let Some(target) = stop_at {
                next = next.min(target - samples);
            }
            let next = next.max(1);
            debug!(samples, error, tolerance, next, "Tolerance not met, adding samples");
            self.add_samples(next)?;
            samples = self.accumulator.samples();
            error = self.accumulator.error_estimate();
        }
        Ok(self.accumulator.mean())
    }
}

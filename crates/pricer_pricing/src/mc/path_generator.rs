//! Multi-factor path generation.
//!
//! A path over `n` steps of a process with `m` factors consumes one Gaussian
//! sequence of `n * m` normals laid out step-major: entry `i * m + j` drives
//! factor `j` over step `i`. With a Brownian bridge the entries for factor
//! `j` are instead read in bridge order, so the leading coordinates of a
//! low-discrepancy point fix the terminal values of every factor.
//!
//! The generator keeps the last sequence it drew, so
//! [`antithetic`](PathGenerator::antithetic) rebuilds the mirror path from
//! the negated draws without consuming the sequence again.

use std::sync::Arc;

use pricer_models::models::StochasticProcess;

use super::config::SequenceSettings;
use super::error::{McError, RngError};
use super::path::{MultiPath, Sample};
use super::time_grid::TimeGrid;
use crate::rng::{BrownianBridge, SequenceGenerator};

/// Generates paths of a process along a fixed time grid.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use pricer_models::models::BlackScholesProcess;
/// use pricer_pricing::mc::{PathGenerator, TimeGrid};
/// use pricer_pricing::rng::{RngKind, SequenceGenerator};
///
/// let process = BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).unwrap();
/// let grid = Arc::new(TimeGrid::regular(1.0, 12).unwrap());
/// let rng = SequenceGenerator::for_batch(RngKind::PseudoRandom, 12, 42, 0, 1).unwrap();
/// let mut generator = PathGenerator::new(&process, grid, rng, false).unwrap();
///
/// let up = generator.next().unwrap().value.value(12, 0);
/// let down = generator.antithetic().unwrap().value.value(12, 0);
/// // Mirror draws: the log returns cancel up to the drift
/// let drift = 2.0 * (0.05 - 0.5 * 0.2 * 0.2);
/// assert!(((up / 100.0).ln() + (down / 100.0).ln() - drift).abs() < 1e-10);
/// ```
pub struct PathGenerator<'a, P: StochasticProcess + ?Sized> {
    process: &'a P,
    grid: Arc<TimeGrid>,
    generator: SequenceGenerator,
    bridge: Option<BrownianBridge>,
    factors: usize,
    draws: Vec<f64>,
    weight: f64,
    increments: Vec<f64>,
    bridge_in: Vec<f64>,
    bridge_out: Vec<f64>,
    path: MultiPath,
}

impl<'a, P: StochasticProcess + ?Sized> PathGenerator<'a, P> {
    /// Number of normals one path consumes.
    pub fn dimension(process: &P, grid: &TimeGrid) -> usize {
        grid.steps() * process.factors()
    }

    /// Creates a generator drawing from `generator`.
    ///
    /// # Errors
    ///
    /// [`McError::InvalidInput`] when the grid has no steps or the sequence
    /// dimension differs from [`dimension`](Self::dimension).
    pub fn new(
        process: &'a P,
        grid: Arc<TimeGrid>,
        generator: SequenceGenerator,
        brownian_bridge: bool,
    ) -> Result<Self, McError> {
        let steps = grid.steps();
        if steps == 0 {
            return Err(McError::InvalidInput("time grid has no steps".to_string()));
        }
        let factors = process.factors();
        let dimension = steps * factors;
        if generator.dimension() != dimension {
            return Err(McError::InvalidInput(format!(
                "sequence dimension {} differs from {steps} steps x {factors} factors",
                generator.dimension()
            )));
        }
        let bridge = brownian_bridge.then(|| BrownianBridge::new(&grid.times()[1..]));
        let path = MultiPath::new(Arc::clone(&grid), process.size());

        Ok(Self {
            process,
            grid,
            generator,
            bridge,
            factors,
            draws: vec![0.0; dimension],
            weight: 1.0,
            increments: vec![0.0; dimension],
            bridge_in: vec![0.0; steps],
            bridge_out: vec![0.0; steps],
            path,
        })
    }

    /// Generator of batch `batch` of a run, starting at sequence `offset`
    /// past the pass's first sequence.
    pub fn for_batch(
        process: &'a P,
        grid: Arc<TimeGrid>,
        settings: &SequenceSettings,
        batch: u64,
        offset: u64,
    ) -> Result<Self, McError> {
        let dimension = Self::dimension(process, &grid);
        if dimension == 0 {
            return Err(McError::InvalidInput("time grid has no steps".to_string()));
        }
        let generator =
            SequenceGenerator::for_batch(
            settings.rng,
            dimension,
            settings.seed,
            batch,
            settings.first_sequence + offset,
        )?;
        Self::new(process, grid, generator, settings.brownian_bridge)
    }

    /// Time grid the paths live on.
    #[inline]
    pub fn time_grid(&self) -> &Arc<TimeGrid> {
        &self.grid
    }

    /// Draws a new sequence and returns the corresponding path.
    ///
    /// # Errors
    ///
    /// Propagates sequence exhaustion.
    pub fn next(&mut self) -> Result<Sample<&MultiPath>, RngError> {
        self.weight = self.generator.next_sequence(&mut self.draws)?;
        self.build(false);
        Ok(Sample {
            value: &self.path,
            weight: self.weight,
        })
    }

    /// Returns the path of the negated last draw.
    ///
    /// Before the first [`next`](Self::next) this is the zero-shock path.
    pub fn antithetic(&mut self) -> Result<Sample<&MultiPath>, RngError> {
        self.build(true);
        Ok(Sample {
            value: &self.path,
            weight: self.weight,
        })
    }

    fn build(&mut self, negate: bool) {
        let sign = if negate { -1.0 } else { 1.0 };
        let steps = self.grid.steps();
        let m = self.factors;

        match &self.bridge {
            Some(bridge) => {
                for j in 0..m {
                    for i in 0..steps {
                        self.bridge_in[i] = sign * self.draws[i * m + j];
                    }
                    bridge.transform(&self.bridge_in, &mut self.bridge_out);
                    for i in 0..steps {
                        self.increments[i * m + j] = self.bridge_out[i];
                    }
                }
            }
            None => {
                for (dw, z) in self.increments.iter_mut().zip(&self.draws) {
                    *dw = sign * z;
                }
            }
        }

        let initial = self.process.initial_values();
        self.path.state_mut(0).copy_from_slice(&initial);
        for i in 0..steps {
            let next = self.process.evolve(
                self.grid.time(i),
                self.path.state(i),
                self.grid.dt(i),
                &self.increments[i * m..(i + 1) * m],
            );
            self.path.state_mut(i + 1).copy_from_slice(&next);
        }
    }
}

//! Gaussian sequence generators.
//!
//! A path of `steps` steps driven by `factors` Brownian motions consumes one
//! sequence of `steps * factors` standard normals. [`SequenceGenerator`] is
//! the closed set of sources the simulation can draw from; each parallel
//! batch builds its own generator positioned on its own substream.

use pricer_models::analytical::inverse_norm_cdf;

use super::halton::HaltonSequence;
use super::prng::PricerRng;
use crate::mc::error::RngError;

/// Random number source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RngKind {
    /// Seeded pseudo-random normals
    #[default]
    PseudoRandom,
    /// Halton points mapped through the inverse normal CDF
    LowDiscrepancy,
}

/// Source of standard normal sequences.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::rng::{RngKind, SequenceGenerator};
///
/// let mut generator = SequenceGenerator::for_batch(RngKind::LowDiscrepancy, 3, 42, 0, 0).unwrap();
/// let mut normals = [0.0; 3];
/// let weight = generator.next_sequence(&mut normals).unwrap();
/// assert_eq!(weight, 1.0);
/// assert!(normals[0].abs() < 1e-12); // first Halton coordinate is 0.5
/// ```
#[derive(Debug, Clone)]
pub enum SequenceGenerator {
    /// Pseudo-random substream
    PseudoRandom {
        /// Generator of this substream
        rng: PricerRng,
        /// Sequence length
        dimension: usize,
    },
    /// Halton sequence positioned at the batch start
    LowDiscrepancy {
        /// Underlying uniform sequence
        halton: HaltonSequence,
        /// Scratch for uniforms
        buffer: Vec<f64>,
    },
}

impl SequenceGenerator {
    /// Creates the generator for batch `batch` of a run, whose first
    /// sequence is sequence number `offset` of the run.
    ///
    /// Pseudo-random batches draw from substream `batch` of `seed`; Halton
    /// batches skip to point `offset`, so consecutive batches tile the
    /// sequence without overlap.
    pub fn for_batch(
        kind: RngKind,
        dimension: usize,
        seed: u64,
        batch: u64,
        offset: u64,
    ) -> Result<Self, RngError> {
        if dimension == 0 {
            return Err(RngError::ZeroDimension);
        }
        Ok(match kind {
            RngKind::PseudoRandom => SequenceGenerator::PseudoRandom {
                rng: PricerRng::substream(seed, batch),
                dimension,
            },
            RngKind::LowDiscrepancy => {
                let mut halton = HaltonSequence::new(dimension)?;
                halton.skip_to(offset);
                SequenceGenerator::LowDiscrepancy {
                    halton,
                    buffer: vec![0.0; dimension],
                }
            }
        })
    }

    /// Sequence length.
    pub fn dimension(&self) -> usize {
        match self {
            SequenceGenerator::PseudoRandom { dimension, .. } => *dimension,
            SequenceGenerator::LowDiscrepancy { halton, .. } => halton.dimension(),
        }
    }

    /// Fills `out` with the next sequence of standard normals and returns
    /// its weight.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != dimension()`.
    pub fn next_sequence(&mut self, out: &mut [f64]) -> Result<f64, RngError> {
        match self {
            SequenceGenerator::PseudoRandom { rng, dimension } => {
                assert_eq!(out.len(), *dimension, "sequence length");
                rng.fill_normal(out);
            }
            SequenceGenerator::LowDiscrepancy { halton, buffer } => {
                halton.next_point(buffer)?;
                for (z, &u) in out.iter_mut().zip(buffer.iter()) {
                    *z = inverse_norm_cdf(u);
                }
            }
        }
        Ok(1.0)
    }
}

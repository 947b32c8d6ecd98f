//! # Random Number Generation Infrastructure
//!
//! Sources of standard normal sequences for the Monte Carlo core.
//!
//! ## Design Rationale
//!
//! - **Reproducibility**: every generator is seeded; parallel batches draw
//!   from substreams keyed by batch number, never from a shared generator
//! - **Efficiency**: batch operations fill caller-owned `&mut [f64]` slices
//! - **Closed dispatch**: [`SequenceGenerator`] is an enum over the supported
//!   sources, chosen at run time through [`RngKind`]
//!
//! ## Module Structure
//!
//! - [`prng`]: seeded pseudo-random normals and substreams
//! - [`halton`]: Halton low-discrepancy sequence with exact `skip_to`
//! - [`sequence`]: Gaussian sequence generator over both sources
//! - [`brownian_bridge`]: bridge reordering of normals along a time grid
//!
//! ## Usage Example
//!
//! ```rust
//! use pricer_pricing::rng::PricerRng;
//!
//! // Create a seeded RNG for reproducible simulations
//! let mut rng = PricerRng::from_seed(12345);
//!
//! // Generate uniform random values in [0, 1)
//! let uniform_value = rng.gen_uniform();
//! assert!((0.0..1.0).contains(&uniform_value));
//!
//! // Batch generation into pre-allocated buffer (zero allocation)
//! let mut buffer = vec![0.0; 1000];
//! rng.fill_normal(&mut buffer);
//! ```

pub mod brownian_bridge;
pub mod halton;
pub mod prng;
pub mod sequence;

pub use brownian_bridge::BrownianBridge;
pub use halton::{HaltonSequence, HALTON_PERIOD};
pub use prng::PricerRng;
pub use sequence::{RngKind, SequenceGenerator};

//! Stochastic processes for Monte Carlo simulation.
//!
//! This module provides:
//! - [`StochasticProcess`]: capability interface (drift, diffusion, apply, evolve)
//! - [`Discretization`]: Euler or predictor-corrector drift estimation
//! - [`BlackScholesProcess`], [`HestonProcess`]: equity processes
//! - [`rates::lmm`]: LIBOR market model, drift calculators and curve state
//! - [`ProcessEnum`]: static dispatch over the closed set of processes
//!
//! ## Design Philosophy
//!
//! Processes compose a discretisation scheme rather than override `evolve`:
//! each process names its [`Discretization`], and the shared steppers in
//! [`evolver`] do the work. Engines hold a [`ProcessEnum`], so dispatch is a
//! `match` and not a vtable.
//!
//! ## Example
//!
//! ```
//! use pricer_models::models::{BlackScholesProcess, ProcessEnum, StochasticProcess};
//!
//! let process = ProcessEnum::from(BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).unwrap());
//! let dt = 1.0 / 252.0;
//! let mut state = process.initial_values();
//! for step in 0..10 {
//!     state = process.evolve(step as f64 * dt, &state, dt, &[0.0]);
//! }
//! assert!(state[0] > 100.0);
//! ```

pub mod black_scholes;
pub mod error;
pub mod evolver;
pub mod heston;
pub mod model_enum;
pub mod rates;
pub mod stochastic;

pub use black_scholes::BlackScholesProcess;
pub use error::ModelError;
pub use evolver::Discretization;
pub use heston::HestonProcess;
pub use model_enum::ProcessEnum;
pub use stochastic::StochasticProcess;

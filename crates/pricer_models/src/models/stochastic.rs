//! Stochastic process capability interface.
//!
//! A process describes `dX = μ(t, X) dt + σ(t, X) dW` through a small, fixed
//! set of capabilities: dimensions, initial state, drift, diffusion, and how
//! an increment is applied to a state. Discretisation lives in
//! [`evolver`](super::evolver) and is selected per process via
//! [`Discretization`], so processes compose an evolution scheme instead of
//! overriding one.
//!
//! Drift and increments are expressed in the coordinates used by
//! [`apply`](StochasticProcess::apply). For log-normal variables `apply` is
//! multiplicative (`x1 = x0 · exp(dx)`), so drift is the drift of the log.
//!
//! ## Example
//!
//! ```
//! use nalgebra::DMatrix;
//! use pricer_models::models::{Discretization, StochasticProcess};
//!
//! /// Driftless arithmetic Brownian motion.
//! struct Abm(f64);
//!
//! impl StochasticProcess for Abm {
//!     fn size(&self) -> usize { 1 }
//!     fn initial_values(&self) -> Vec<f64> { vec![0.0] }
//!     fn drift(&self, _t: f64, _x: &[f64]) -> Vec<f64> { vec![0.0] }
//!     fn diffusion(&self, _t: f64, _x: &[f64]) -> DMatrix<f64> {
//!         DMatrix::from_element(1, 1, self.0)
//!     }
//! }
//!
//! let p = Abm(0.3);
//! let x1 = p.evolve(0.0, &[1.0], 0.25, &[2.0]);
//! assert!((x1[0] - (1.0 + 0.3 * 0.5 * 2.0)).abs() < 1e-15);
//! assert_eq!(p.discretization(), Discretization::Euler);
//! ```

use nalgebra::DMatrix;

use super::evolver::{self, Discretization};

/// Capability interface every simulated process implements.
///
/// Implementors must be `Send + Sync`: one process instance is shared by all
/// worker threads of a simulation.
pub trait StochasticProcess: Send + Sync {
    /// Number of state variables.
    fn size(&self) -> usize;

    /// Number of independent Brownian drivers.
    fn factors(&self) -> usize {
        self.size()
    }

    /// State at time zero.
    fn initial_values(&self) -> Vec<f64>;

    /// Drift `μ(t, x)` per unit time, in `apply` coordinates.
    fn drift(&self, t: f64, x: &[f64]) -> Vec<f64>;

    /// Diffusion `σ(t, x)`, a `size() x factors()` matrix per unit time.
    fn diffusion(&self, t: f64, x: &[f64]) -> DMatrix<f64>;

    /// Applies an increment to a state. Additive unless overridden.
    fn apply(&self, x0: &[f64], dx: &[f64]) -> Vec<f64> {
        x0.iter().zip(dx).map(|(x, d)| x + d).collect()
    }

    /// Conditional expectation over `[t0, t0 + dt]`, to first order.
    fn expectation(&self, t0: f64, x0: &[f64], dt: f64) -> Vec<f64> {
        let dx: Vec<f64> = self.drift(t0, x0).iter().map(|m| m * dt).collect();
        self.apply(x0, &dx)
    }

    /// Standard deviation over `[t0, t0 + dt]`: `σ(t0, x0) √dt`.
    fn std_deviation(&self, t0: f64, x0: &[f64], dt: f64) -> DMatrix<f64> {
        self.diffusion(t0, x0) * dt.sqrt()
    }

    /// Covariance over `[t0, t0 + dt]`.
    fn covariance(&self, t0: f64, x0: &[f64], dt: f64) -> DMatrix<f64> {
        let sd = self.std_deviation(t0, x0, dt);
        &sd * sd.transpose()
    }

    /// Discretisation scheme used by [`evolve`](StochasticProcess::evolve).
    fn discretization(&self) -> Discretization {
        Discretization::Euler
    }

    /// Advances `x0` from `t0` to `t0 + dt` given standard normal draws `dw`
    /// (length `factors()`).
    fn evolve(&self, t0: f64, x0: &[f64], dt: f64, dw: &[f64]) -> Vec<f64> {
        match self.discretization() {
            Discretization::Euler => evolver::euler_step(self, t0, x0, dt, dw),
            Discretization::PredictorCorrector => {
                evolver::predictor_corrector_step(self, t0, x0, dt, dw)
            }
        }
    }
}

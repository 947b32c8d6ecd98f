//! Static dispatch enum over the supported processes.
//!
//! `ProcessEnum` is the closed set of processes the Monte Carlo engines
//! simulate. Dispatch is a `match` per call, with no trait objects on the
//! hot path.
//!
//! ## Example
//!
//! ```
//! use pricer_models::models::{BlackScholesProcess, ProcessEnum, StochasticProcess};
//!
//! let process: ProcessEnum = BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).unwrap().into();
//! assert_eq!(process.name(), "BlackScholes");
//! assert_eq!(process.size(), 1);
//! assert_eq!(process.initial_values(), vec![100.0]);
//! ```

use nalgebra::DMatrix;

use super::black_scholes::BlackScholesProcess;
use super::evolver::Discretization;
use super::heston::HestonProcess;
use super::rates::lmm::LiborMarketModelProcess;
use super::stochastic::StochasticProcess;

/// Closed set of simulated processes.
#[derive(Debug, Clone)]
pub enum ProcessEnum {
    /// Geometric Brownian motion
    BlackScholes(BlackScholesProcess),
    /// Heston stochastic volatility
    Heston(HestonProcess),
    /// LIBOR market model
    Lmm(Box<LiborMarketModelProcess>),
}

impl ProcessEnum {
    /// Short process name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessEnum::BlackScholes(_) => "BlackScholes",
            ProcessEnum::Heston(_) => "Heston",
            ProcessEnum::Lmm(_) => "LiborMarketModel",
        }
    }
}

impl From<BlackScholesProcess> for ProcessEnum {
    fn from(p: BlackScholesProcess) -> Self {
        ProcessEnum::BlackScholes(p)
    }
}

impl From<HestonProcess> for ProcessEnum {
    fn from(p: HestonProcess) -> Self {
        ProcessEnum::Heston(p)
    }
}

impl From<LiborMarketModelProcess> for ProcessEnum {
    fn from(p: LiborMarketModelProcess) -> Self {
        ProcessEnum::Lmm(Box::new(p))
    }
}

macro_rules! dispatch {
    ($self:ident, $p:ident => $body:expr) => {
        match $self {
            ProcessEnum::BlackScholes($p) => $body,
            ProcessEnum::Heston($p) => $body,
            ProcessEnum::Lmm($p) => $body,
        }
    };
}

impl StochasticProcess for ProcessEnum {
    fn size(&self) -> usize {
        dispatch!(self, p => p.size())
    }

    fn factors(&self) -> usize {
        dispatch!(self, p => p.factors())
    }

    fn initial_values(&self) -> Vec<f64> {
        dispatch!(self, p => p.initial_values())
    }

    fn drift(&self, t: f64, x: &[f64]) -> Vec<f64> {
        dispatch!(self, p => p.drift(t, x))
    }

    fn diffusion(&self, t: f64, x: &[f64]) -> DMatrix<f64> {
        dispatch!(self, p => p.diffusion(t, x))
    }

    fn apply(&self, x0: &[f64], dx: &[f64]) -> Vec<f64> {
        dispatch!(self, p => p.apply(x0, dx))
    }

    fn std_deviation(&self, t0: f64, x0: &[f64], dt: f64) -> DMatrix<f64> {
        dispatch!(self, p => p.std_deviation(t0, x0, dt))
    }

    fn discretization(&self) -> Discretization {
        dispatch!(self, p => p.discretization())
    }

    fn evolve(&self, t0: f64, x0: &[f64], dt: f64, dw: &[f64]) -> Vec<f64> {
        dispatch!(self, p => p.evolve(t0, x0, dt, dw))
    }
}

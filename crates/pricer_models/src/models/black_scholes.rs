//! Black-Scholes-Merton process.
//!
//! ## SDE
//!
//! ```text
//! dS = (r - q) S dt + σ S dW
//! ```
//!
//! Drift and increments are expressed in log-spot, so with constant
//! parameters a single Euler step is the exact log-normal transition:
//!
//! ```text
//! S(t + dt) = S(t) · exp((r - q - σ²/2) dt + σ √dt Z)
//! ```

use nalgebra::DMatrix;

use super::error::ModelError;
use super::stochastic::StochasticProcess;

/// Constant-parameter geometric Brownian motion for a single spot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlackScholesProcess {
    spot: f64,
    rate: f64,
    dividend: f64,
    volatility: f64,
}

impl BlackScholesProcess {
    /// Creates a process. Spot must be positive and volatility non-negative.
    ///
    /// # Examples
    /// ```
    /// use pricer_models::models::BlackScholesProcess;
    ///
    /// assert!(BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).is_ok());
    /// assert!(BlackScholesProcess::new(-1.0, 0.05, 0.0, 0.2).is_err());
    /// ```
    pub fn new(spot: f64, rate: f64, dividend: f64, volatility: f64) -> Result<Self, ModelError> {
        if !(spot.is_finite() && spot > 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "spot",
                value: spot,
            });
        }
        if !(volatility.is_finite() && volatility >= 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "volatility",
                value: volatility,
            });
        }
        if !rate.is_finite() {
            return Err(ModelError::InvalidParameter {
                name: "rate",
                value: rate,
            });
        }
        if !dividend.is_finite() {
            return Err(ModelError::InvalidParameter {
                name: "dividend",
                value: dividend,
            });
        }
        Ok(Self {
            spot,
            rate,
            dividend,
            volatility,
        })
    }

    /// Initial spot.
    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    /// Continuously compounded risk-free rate.
    #[inline]
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Continuous dividend yield.
    #[inline]
    pub fn dividend(&self) -> f64 {
        self.dividend
    }

    /// Log-normal volatility.
    #[inline]
    pub fn volatility(&self) -> f64 {
        self.volatility
    }
}

impl StochasticProcess for BlackScholesProcess {
    fn size(&self) -> usize {
        1
    }

    fn initial_values(&self) -> Vec<f64> {
        vec![self.spot]
    }

    fn drift(&self, _t: f64, _x: &[f64]) -> Vec<f64> {
        vec![self.rate - self.dividend - 0.5 * self.volatility * self.volatility]
    }

    fn diffusion(&self, _t: f64, _x: &[f64]) -> DMatrix<f64> {
        DMatrix::from_element(1, 1, self.volatility)
    }

    fn apply(&self, x0: &[f64], dx: &[f64]) -> Vec<f64> {
        vec![x0[0] * dx[0].exp()]
    }
}

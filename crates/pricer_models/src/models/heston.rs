//! Heston stochastic volatility process.
//!
//! ## SDE
//!
//! ```text
//! dS = (r - q) S dt + √v S dW₁
//! dv = κ(θ - v) dt + ξ √v dW₂
//! d⟨W₁, W₂⟩ = ρ dt
//! ```
//!
//! The state is `(S, v)`. Spot is stepped in log coordinates and variance
//! with full truncation: wherever the variance enters the drift or the
//! diffusion it is floored at zero, while the state itself may go negative.

use nalgebra::DMatrix;

use super::error::ModelError;
use super::stochastic::StochasticProcess;

/// Heston process parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HestonProcess {
    spot: f64,
    v0: f64,
    kappa: f64,
    theta: f64,
    xi: f64,
    rho: f64,
    rate: f64,
    dividend: f64,
}

impl HestonProcess {
    /// Creates a Heston process.
    ///
    /// # Arguments
    ///
    /// * `spot` - initial spot, positive
    /// * `v0` - initial variance, non-negative
    /// * `kappa` - mean reversion speed, non-negative
    /// * `theta` - long-run variance, non-negative
    /// * `xi` - volatility of variance, non-negative
    /// * `rho` - spot/variance correlation in `[-1, 1]`
    /// * `rate`, `dividend` - continuously compounded carry
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spot: f64,
        v0: f64,
        kappa: f64,
        theta: f64,
        xi: f64,
        rho: f64,
        rate: f64,
        dividend: f64,
    ) -> Result<Self, ModelError> {
        if !(spot.is_finite() && spot > 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "spot",
                value: spot,
            });
        }
        for (name, value) in [("v0", v0), ("kappa", kappa), ("theta", theta), ("xi", xi)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ModelError::InvalidParameter { name, value });
            }
        }
        if !(-1.0..=1.0).contains(&rho) {
            return Err(ModelError::InvalidParameter {
                name: "rho",
                value: rho,
            });
        }
        Ok(Self {
            spot,
            v0,
            kappa,
            theta,
            xi,
            rho,
            rate,
            dividend,
        })
    }

    /// Initial variance.
    #[inline]
    pub fn v0(&self) -> f64 {
        self.v0
    }

    /// Whether `2κθ ≥ ξ²`.
    pub fn satisfies_feller(&self) -> bool {
        2.0 * self.kappa * self.theta >= self.xi * self.xi
    }
}

impl StochasticProcess for HestonProcess {
    fn size(&self) -> usize {
        2
    }

    fn initial_values(&self) -> Vec<f64> {
        vec![self.spot, self.v0]
    }

    fn drift(&self, _t: f64, x: &[f64]) -> Vec<f64> {
        let v = x[1].max(0.0);
        vec![
            self.rate - self.dividend - 0.5 * v,
            self.kappa * (self.theta - v),
        ]
    }

    fn diffusion(&self, _t: f64, x: &[f64]) -> DMatrix<f64> {
        let vol = x[1].max(0.0).sqrt();
        let ortho = (1.0 - self.rho * self.rho).max(0.0).sqrt();
        DMatrix::from_row_slice(
            2,
            2,
            &[
                vol,
                0.0,
                self.xi * self.rho * vol,
                self.xi * ortho * vol,
            ],
        )
    }

    fn apply(&self, x0: &[f64], dx: &[f64]) -> Vec<f64> {
        vec![x0[0] * dx[0].exp(), x0[1] + dx[1]]
    }
}

//! Flat-volatility LIBOR market model with exponential correlation.
//!
//! Each forward `f_i` has a constant displaced log-normal volatility `σ_i` up
//! to its reset `T_i` and is dead afterwards. Instantaneous correlation is
//!
//! ```text
//! ρ_ij = L + (1 - L) exp(-β |T_i - T_j|)
//! ```
//!
//! For an evolution step `[t_{k-1}, t_k]` the covariance of the log forwards is
//!
//! ```text
//! C_ij = σ_i σ_j ρ_ij max(0, min(t_k, T_i, T_j) - t_{k-1})
//! ```
//!
//! and is factorised into an `n x F` pseudo-root by principal components.

use nalgebra::DMatrix;
use pricer_core::math::rank_reduced_sqrt;

use super::super::super::error::ModelError;

/// Long-term level `L` and decay `β` of exponential correlation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExponentialCorrelation {
    /// Long-term correlation level `L` in `[0, 1]`
    pub long_term: f64,
    /// Decay rate `β ≥ 0`
    pub beta: f64,
}

impl ExponentialCorrelation {
    /// Correlation between rates resetting at `t_i` and `t_j`.
    #[inline]
    pub fn correlation(&self, t_i: f64, t_j: f64) -> f64 {
        self.long_term + (1.0 - self.long_term) * (-self.beta * (t_i - t_j).abs()).exp()
    }

    /// Correlation matrix over the given reset times.
    pub fn matrix(&self, times: &[f64]) -> DMatrix<f64> {
        DMatrix::from_fn(times.len(), times.len(), |i, j| {
            self.correlation(times[i], times[j])
        })
    }
}

/// Numeraire choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Measure {
    /// Bond maturing at the last rate time `T_n`
    #[default]
    Terminal,
    /// Discretely rolled spot LIBOR account
    Spot,
}

/// Static inputs of a flat-volatility market model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LmmParameters {
    /// Rate times `T_0 < ... < T_n`
    pub rate_times: Vec<f64>,
    /// Initial forwards `f_0 .. f_{n-1}`
    pub initial_forwards: Vec<f64>,
    /// Volatilities `σ_0 .. σ_{n-1}`
    pub volatilities: Vec<f64>,
    /// Displacements `δ_0 .. δ_{n-1}`
    pub displacements: Vec<f64>,
    /// Instantaneous correlation
    pub correlation: ExponentialCorrelation,
    /// Number of driving factors `F`
    pub factors: usize,
    /// Numeraire
    pub measure: Measure,
}

impl LmmParameters {
    /// Number of forward rates.
    #[inline]
    pub fn number_of_rates(&self) -> usize {
        self.initial_forwards.len()
    }

    /// Accrual fractions `T_{i+1} - T_i`.
    pub fn taus(&self) -> Vec<f64> {
        self.rate_times.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Checks dimensions and parameter ranges.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.number_of_rates();
        if n == 0 {
            return Err(ModelError::PreconditionViolation(
                "at least one forward rate is required".to_string(),
            ));
        }
        if self.rate_times.len() != n + 1 {
            return Err(ModelError::DimensionMismatch {
                what: "rate times",
                expected: n + 1,
                got: self.rate_times.len(),
            });
        }
        for (what, v) in [
            ("volatilities", &self.volatilities),
            ("displacements", &self.displacements),
        ] {
            if v.len() != n {
                return Err(ModelError::DimensionMismatch {
                    what,
                    expected: n,
                    got: v.len(),
                });
            }
        }
        if self.rate_times[0] < 0.0 || self.rate_times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ModelError::PreconditionViolation(
                "rate times must be non-negative and strictly increasing".to_string(),
            ));
        }
        if let Some(&vol) = self.volatilities.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
            return Err(ModelError::InvalidParameter {
                name: "volatility",
                value: vol,
            });
        }
        for (f, d) in self.initial_forwards.iter().zip(&self.displacements) {
            if !(f + d > 0.0) {
                return Err(ModelError::InvalidParameter {
                    name: "displaced forward",
                    value: f + d,
                });
            }
        }
        if self.factors == 0 || self.factors > n {
            return Err(ModelError::PreconditionViolation(format!(
                "number of factors {} outside 1..={n}",
                self.factors
            )));
        }
        let l = self.correlation.long_term;
        if !(0.0..=1.0).contains(&l) {
            return Err(ModelError::InvalidParameter {
                name: "long-term correlation",
                value: l,
            });
        }
        if !(self.correlation.beta >= 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "correlation decay",
                value: self.correlation.beta,
            });
        }
        Ok(())
    }
}

/// Covariance data of one evolution step.
#[derive(Debug, Clone)]
pub struct EvolutionStep {
    /// Step start time
    pub start: f64,
    /// Step end time
    pub end: f64,
    /// First rate still alive at the start of the step
    pub alive: usize,
    /// Numeraire index for the step
    pub numeraire: usize,
    /// `n x F` pseudo-root of the step covariance
    pub pseudo_root: DMatrix<f64>,
}

impl EvolutionStep {
    /// Step covariance `A Aᵀ`.
    pub fn covariance(&self) -> DMatrix<f64> {
        &self.pseudo_root * self.pseudo_root.transpose()
    }
}

/// Flat-volatility market model discretised on evolution times.
#[derive(Debug, Clone)]
pub struct FlatVolMarketModel {
    parameters: LmmParameters,
    steps: Vec<EvolutionStep>,
}

impl FlatVolMarketModel {
    /// Builds the model on evolution times `t_1 < ... < t_m`, all positive
    /// and no later than the last reset `T_{n-1}`. The first step starts at 0.
    pub fn new(parameters: LmmParameters, evolution_times: &[f64]) -> Result<Self, ModelError> {
        parameters.validate()?;
        let n = parameters.number_of_rates();
        let last_reset = parameters.rate_times[n - 1];

        if evolution_times.is_empty() {
            return Err(ModelError::PreconditionViolation(
                "at least one evolution time is required".to_string(),
            ));
        }
        if evolution_times[0] <= 0.0 || evolution_times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ModelError::PreconditionViolation(
                "evolution times must be positive and strictly increasing".to_string(),
            ));
        }
        if let Some(&late) = evolution_times.last().filter(|t| **t > last_reset + 1e-12) {
            return Err(ModelError::PreconditionViolation(format!(
                "evolution time {late} beyond last reset {last_reset}"
            )));
        }

        let times = &parameters.rate_times;
        let correlation = parameters.correlation.matrix(&times[..n]);
        let vols = &parameters.volatilities;

        let mut steps = Vec::with_capacity(evolution_times.len());
        let mut start = 0.0;
        for &end in evolution_times {
            let alive = times[..n].partition_point(|&t| t <= start);
            let numeraire = match parameters.measure {
                Measure::Terminal => n,
                Measure::Spot => times[..n].partition_point(|&t| t < end),
            };

            let live = n - alive;
            let block = DMatrix::from_fn(live, live, |a, b| {
                let (i, j) = (alive + a, alive + b);
                let horizon = end.min(times[i]).min(times[j]);
                vols[i] * vols[j] * correlation[(i, j)] * (horizon - start).max(0.0)
            });
            let mut pseudo_root = DMatrix::zeros(n, parameters.factors);
            if live > 0 {
                let root = rank_reduced_sqrt(&block, parameters.factors.min(live), 1.0)?;
                pseudo_root
                    .view_mut((alive, 0), (live, root.ncols()))
                    .copy_from(&root);
            }

            steps.push(EvolutionStep {
                start,
                end,
                alive,
                numeraire: numeraire.max(alive),
                pseudo_root,
            });
            start = end;
        }

        Ok(Self { parameters, steps })
    }

    /// Model inputs.
    #[inline]
    pub fn parameters(&self) -> &LmmParameters {
        &self.parameters
    }

    /// Evolution steps in time order.
    #[inline]
    pub fn steps(&self) -> &[EvolutionStep] {
        &self.steps
    }

    /// Total covariance from 0 to the end of step `k`.
    pub fn total_covariance(&self, k: usize) -> DMatrix<f64> {
        let n = self.parameters.number_of_rates();
        self.steps[..=k]
            .iter()
            .fold(DMatrix::zeros(n, n), |acc, s| acc + s.covariance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parameters(factors: usize, measure: Measure) -> LmmParameters {
        LmmParameters {
            rate_times: vec![0.5, 1.0, 1.5, 2.0, 2.5],
            initial_forwards: vec![0.04; 4],
            volatilities: vec![0.2, 0.19, 0.18, 0.17],
            displacements: vec![0.0; 4],
            correlation: ExponentialCorrelation {
                long_term: 0.5,
                beta: 0.8,
            },
            factors,
            measure,
        }
    }

    #[test]
    fn test_full_factor_total_variance_matches_black() {
        let model = FlatVolMarketModel::new(parameters(4, Measure::Terminal), &[0.5, 1.0, 1.5, 2.0])
            .unwrap();
        let total = model.total_covariance(3);
        // Each rate accumulates σ² T_i before it resets
        assert_relative_eq!(total[(0, 0)], 0.04 * 0.5, epsilon = 1e-12);
        assert_relative_eq!(total[(3, 3)], 0.17 * 0.17 * 2.0, epsilon = 1e-12);
        let rho = 0.5 + 0.5 * (-0.8_f64 * 0.5).exp();
        assert_relative_eq!(total[(1, 2)], 0.19 * 0.18 * rho * 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_alive_and_numeraire_indices() {
        let times = [0.5, 1.0, 1.5, 2.0];
        let terminal = FlatVolMarketModel::new(parameters(2, Measure::Terminal), &times).unwrap();
        let alive: Vec<usize> = terminal.steps().iter().map(|s| s.alive).collect();
        assert_eq!(alive, vec![0, 1, 2, 3]);
        assert!(terminal.steps().iter().all(|s| s.numeraire == 4));

        let spot = FlatVolMarketModel::new(parameters(2, Measure::Spot), &times).unwrap();
        let numeraires: Vec<usize> = spot.steps().iter().map(|s| s.numeraire).collect();
        assert_eq!(numeraires, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_dead_rates_have_zero_loadings() {
        let model = FlatVolMarketModel::new(parameters(2, Measure::Terminal), &[0.5, 1.0]).unwrap();
        let second = &model.steps()[1];
        assert!(second.pseudo_root.row(0).iter().all(|&x| x == 0.0));
        assert_eq!(second.pseudo_root.ncols(), 2);
    }

    #[test]
    fn test_rejects_evolution_beyond_last_reset() {
        assert!(FlatVolMarketModel::new(parameters(2, Measure::Terminal), &[1.0, 2.1]).is_err());
        assert!(FlatVolMarketModel::new(parameters(5, Measure::Terminal), &[1.0]).is_err());
    }
}

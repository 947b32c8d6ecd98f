//! No-arbitrage drift of displaced log-normal forward rates.
//!
//! Under the measure whose numeraire is the bond maturing at `T_N`, the
//! drift of `ln(f_i + δ_i)` over one evolution step is, before the Itô term,
//!
//! ```text
//! μ_i = + Σ_{k=N}^{i}     g_k C_ik    for i ≥ N
//! μ_i = - Σ_{k=i+1}^{N-1} g_k C_ik    for i < N
//! g_k = (f_k + δ_k) / (1/τ_k + f_k)
//! ```
//!
//! where `C = A Aᵀ` is the step covariance built from the pseudo-root `A`.
//! Two algorithms are provided:
//!
//! - **Plain** forms `C` explicitly and costs `O(n²)`.
//! - **Reduced** never forms `C`: it accumulates the factor loadings
//!   `e(i) = Σ g_k A_k` outward from the numeraire, where the drift is
//!   exactly zero, and costs `O(n F)`.
//!
//! Both agree to rounding on the same inputs.

use nalgebra::DMatrix;

use super::super::super::error::ModelError;

/// Drift algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DriftAlgorithm {
    /// Full covariance summation
    Plain,
    /// Factor-loading recursion
    Reduced,
    /// Plain for full-factor models, reduced otherwise
    #[default]
    Auto,
}

/// Drift calculator for one evolution step of a LIBOR market model.
///
/// Immutable once built; `compute` may be called concurrently.
#[derive(Debug, Clone)]
pub struct LmmDriftCalculator {
    number_of_rates: usize,
    number_of_factors: usize,
    numeraire: usize,
    alive: usize,
    displacements: Vec<f64>,
    one_over_taus: Vec<f64>,
    pseudo: DMatrix<f64>,
    covariance: DMatrix<f64>,
    downs: Vec<usize>,
    ups: Vec<usize>,
    algorithm: DriftAlgorithm,
}

impl LmmDriftCalculator {
    /// Builds a calculator.
    ///
    /// # Arguments
    ///
    /// * `pseudo` - `n x F` pseudo-root of the step covariance, `0 < F ≤ n`
    /// * `displacements` - one displacement per rate
    /// * `taus` - one accrual fraction per rate
    /// * `numeraire` - index `N` of the numeraire bond, `N ≤ n`
    /// * `alive` - first live rate, `alive ≤ N`
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] when any dimension or index precondition fails.
    ///
    /// # Examples
    /// ```
    /// use nalgebra::DMatrix;
    /// use pricer_models::models::rates::lmm::LmmDriftCalculator;
    ///
    /// let pseudo = DMatrix::from_element(3, 1, 0.1);
    /// let calc = LmmDriftCalculator::new(pseudo, vec![0.0; 3], vec![0.5; 3], 3, 0).unwrap();
    /// let mut drifts = [0.0; 3];
    /// calc.compute(&[0.04, 0.04, 0.04], &mut drifts);
    /// // The rate fixing into the numeraire bond is driftless
    /// assert_eq!(drifts[2], 0.0);
    /// assert!(drifts[0] < drifts[1]);
    /// ```
    pub fn new(
        pseudo: DMatrix<f64>,
        displacements: Vec<f64>,
        taus: Vec<f64>,
        numeraire: usize,
        alive: usize,
    ) -> Result<Self, ModelError> {
        let n = taus.len();
        if n == 0 {
            return Err(ModelError::PreconditionViolation(
                "drift calculator needs at least one rate".to_string(),
            ));
        }
        if pseudo.nrows() != n {
            return Err(ModelError::DimensionMismatch {
                what: "pseudo-root rows",
                expected: n,
                got: pseudo.nrows(),
            });
        }
        if displacements.len() != n {
            return Err(ModelError::DimensionMismatch {
                what: "displacements",
                expected: n,
                got: displacements.len(),
            });
        }
        let factors = pseudo.ncols();
        if factors == 0 || factors > n {
            return Err(ModelError::PreconditionViolation(format!(
                "number of factors {factors} outside 1..={n}"
            )));
        }
        if numeraire > n {
            return Err(ModelError::PreconditionViolation(format!(
                "numeraire {numeraire} exceeds number of rates {n}"
            )));
        }
        if alive > numeraire {
            return Err(ModelError::PreconditionViolation(format!(
                "first alive rate {alive} beyond numeraire {numeraire}"
            )));
        }
        if let Some(tau) = taus.iter().find(|t| !(t.is_finite() && **t > 0.0)) {
            return Err(ModelError::InvalidParameter {
                name: "tau",
                value: *tau,
            });
        }

        let covariance = &pseudo * pseudo.transpose();
        let downs = (0..n).map(|i| (i + 1).min(numeraire)).collect();
        let ups = (0..n).map(|i| (i + 1).max(numeraire)).collect();

        Ok(Self {
            number_of_rates: n,
            number_of_factors: factors,
            numeraire,
            alive,
            displacements,
            one_over_taus: taus.iter().map(|t| 1.0 / t).collect(),
            pseudo,
            covariance,
            downs,
            ups,
            algorithm: DriftAlgorithm::Auto,
        })
    }

    /// Selects the algorithm used by [`compute`](Self::compute).
    pub fn with_algorithm(mut self, algorithm: DriftAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Numeraire index.
    #[inline]
    pub fn numeraire(&self) -> usize {
        self.numeraire
    }

    /// First live rate.
    #[inline]
    pub fn alive(&self) -> usize {
        self.alive
    }

    /// Number of factors of the pseudo-root.
    #[inline]
    pub fn number_of_factors(&self) -> usize {
        self.number_of_factors
    }

    /// Step covariance `A Aᵀ`.
    #[inline]
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Computes drifts for live rates into `drifts`; entries below `alive`
    /// are set to zero.
    ///
    /// # Panics
    ///
    /// Panics if `forwards` or `drifts` is not of length `n`.
    pub fn compute(&self, forwards: &[f64], drifts: &mut [f64]) {
        let plain = match self.algorithm {
            DriftAlgorithm::Plain => true,
            DriftAlgorithm::Reduced => false,
            DriftAlgorithm::Auto => self.number_of_factors == self.number_of_rates,
        };
        if plain {
            self.compute_plain(forwards, drifts);
        } else {
            self.compute_reduced(forwards, drifts);
        }
    }

    fn check_lengths(&self, forwards: &[f64], drifts: &[f64]) {
        assert_eq!(forwards.len(), self.number_of_rates, "forward rate count");
        assert_eq!(drifts.len(), self.number_of_rates, "drift buffer length");
    }

    #[inline]
    fn weight(&self, forwards: &[f64], k: usize) -> f64 {
        (forwards[k] + self.displacements[k]) / (self.one_over_taus[k] + forwards[k])
    }

    /// Full covariance summation.
    pub fn compute_plain(&self, forwards: &[f64], drifts: &mut [f64]) {
        self.check_lengths(forwards, drifts);

        drifts[..self.alive].fill(0.0);
        for i in self.alive..self.number_of_rates {
            let sum: f64 = (self.downs[i]..self.ups[i])
                .map(|k| self.weight(forwards, k) * self.covariance[(i, k)])
                .sum();
            drifts[i] = if self.numeraire > i { -sum } else { sum };
        }
    }

    /// Factor-loading recursion, one factor at a time so no scratch is
    /// needed beyond `drifts`.
    pub fn compute_reduced(&self, forwards: &[f64], drifts: &mut [f64]) {
        self.check_lengths(forwards, drifts);
        let n = self.number_of_rates;
        let numeraire = self.numeraire;

        drifts.fill(0.0);
        for r in 0..self.number_of_factors {
            // Backward from the numeraire: e(N-1) = 0
            if numeraire > self.alive {
                let mut e = 0.0;
                for i in (self.alive..numeraire - 1).rev() {
                    e += self.weight(forwards, i + 1) * self.pseudo[(i + 1, r)];
                    drifts[i] -= e * self.pseudo[(i, r)];
                }
            }

            // Forward from the numeraire, restarting from e(N-1) = 0
            let mut e = 0.0;
            for i in numeraire..n {
                e += self.weight(forwards, i) * self.pseudo[(i, r)];
                drifts[i] += e * self.pseudo[(i, r)];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pseudo(n: usize, factors: usize) -> DMatrix<f64> {
        DMatrix::from_fn(n, factors, |i, r| {
            0.2 * ((1 + i + 2 * r) as f64).sqrt().sin() + 0.05 * (r as f64 + 1.0)
        })
    }

    #[test]
    fn test_plain_and_reduced_agree_for_every_numeraire() {
        let n = 6;
        let fwds = [0.03, 0.035, 0.04, 0.042, 0.045, 0.05];
        let taus = vec![0.5; n];
        for factors in 1..=n {
            for alive in 0..n {
                for numeraire in alive..=n {
                    let calc = LmmDriftCalculator::new(
                        pseudo(n, factors),
                        vec![0.01; n],
                        taus.clone(),
                        numeraire,
                        alive,
                    )
                    .unwrap();
                    let mut plain = [0.0; 6];
                    let mut reduced = [0.0; 6];
                    calc.compute_plain(&fwds, &mut plain);
                    calc.compute_reduced(&fwds, &mut reduced);
                    for i in 0..n {
                        assert_relative_eq!(plain[i], reduced[i], epsilon = 1e-14, max_relative = 1e-10);
                    }
                }
            }
        }
    }

    #[test]
    fn test_compute_overwrites_stale_buffer() {
        let n = 5;
        let fwds = [0.03, 0.035, 0.04, 0.042, 0.045];
        for algorithm in [DriftAlgorithm::Plain, DriftAlgorithm::Reduced] {
            let calc = LmmDriftCalculator::new(pseudo(n, 2), vec![0.0; n], vec![0.5; n], 3, 1)
                .unwrap()
                .with_algorithm(algorithm);
            let mut fresh = [0.0; 5];
            calc.compute(&fwds, &mut fresh);
            let mut reused = [f64::NAN; 5];
            calc.compute(&fwds, &mut reused);
            calc.compute(&fwds, &mut reused);
            assert_eq!(reused[0], 0.0);
            assert_eq!(fresh, reused);
        }
    }

    #[test]
    fn test_terminal_measure_drifts_are_non_positive() {
        let n = 4;
        let calc = LmmDriftCalculator::new(
            DMatrix::from_element(n, 1, 0.1),
            vec![0.0; n],
            vec![1.0; n],
            n,
            0,
        )
        .unwrap();
        let mut drifts = [0.0; 4];
        calc.compute(&[0.05; 4], &mut drifts);
        let g = 0.05 / 1.05;
        assert_relative_eq!(drifts[3], 0.0);
        assert_relative_eq!(drifts[2], -g * 0.01, epsilon = 1e-15);
        assert_relative_eq!(drifts[0], -3.0 * g * 0.01, epsilon = 1e-15);
    }

    #[test]
    fn test_spot_measure_drifts_are_non_negative() {
        let n = 3;
        let calc = LmmDriftCalculator::new(
            DMatrix::from_element(n, 1, 0.1),
            vec![0.0; n],
            vec![1.0; n],
            0,
            0,
        )
        .unwrap();
        let mut drifts = [0.0; 3];
        calc.compute(&[0.05; 3], &mut drifts);
        let g = 0.05 / 1.05;
        assert_relative_eq!(drifts[0], g * 0.01, epsilon = 1e-15);
        assert_relative_eq!(drifts[2], 3.0 * g * 0.01, epsilon = 1e-15);
    }

    #[test]
    fn test_dead_rates_have_zero_drift() {
        let calc = LmmDriftCalculator::new(pseudo(5, 2), vec![0.0; 5], vec![0.5; 5], 5, 2)
            .unwrap()
            .with_algorithm(DriftAlgorithm::Reduced);
        let mut drifts = [1.0; 5];
        calc.compute(&[0.04; 5], &mut drifts);
        assert_eq!(&drifts[..2], &[0.0, 0.0]);
    }

    #[test]
    fn test_precondition_violations() {
        let p = pseudo(3, 2);
        assert!(LmmDriftCalculator::new(p.clone(), vec![0.0; 3], vec![0.5; 3], 1, 2).is_err());
        assert!(LmmDriftCalculator::new(p.clone(), vec![0.0; 3], vec![0.5; 3], 4, 0).is_err());
        assert!(LmmDriftCalculator::new(p.clone(), vec![0.0; 2], vec![0.5; 3], 3, 0).is_err());
        assert!(LmmDriftCalculator::new(p, vec![0.0; 3], vec![0.5; 2], 3, 0).is_err());
        assert!(
            LmmDriftCalculator::new(DMatrix::zeros(3, 4), vec![0.0; 3], vec![0.5; 3], 3, 0).is_err()
        );
    }
}

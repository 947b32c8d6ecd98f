//! Forward-rate curve state on a LIBOR tenor structure.
//!
//! For rate times `T_0 < T_1 < ... < T_n` with accruals `τ_i = T_{i+1} - T_i`
//! and forwards `f_0 .. f_{n-1}`, the state exposes discount ratios to the
//! terminal bond
//!
//! ```text
//! d_n = 1,  d_i = d_{i+1} (1 + τ_i f_i)   so   d_i = P(T_i) / P(T_n)
//! ```
//!
//! and, from a first valid index onwards, coterminal annuities and swap rates
//!
//! ```text
//! A_i = Σ_{k=i}^{n-1} τ_k d_{k+1},   S_i = (d_i - d_n) / A_i
//! ```
//!
//! Derived quantities are computed lazily and cached until the forwards change.

use std::sync::OnceLock;

use super::super::super::error::ModelError;

/// Tenor structure and forwards of a LIBOR market model.
#[derive(Debug, Clone)]
pub struct LmmCurveState {
    rate_times: Vec<f64>,
    taus: Vec<f64>,
    forwards: Vec<f64>,
    first_valid: usize,
    discount_ratios: OnceLock<Vec<f64>>,
    annuities: OnceLock<Vec<f64>>,
}

impl LmmCurveState {
    /// Creates a state on the given rate times (at least two, strictly
    /// increasing). Forwards start at zero until
    /// [`set_on_forward_rates`](Self::set_on_forward_rates) is called.
    pub fn new(rate_times: Vec<f64>) -> Result<Self, ModelError> {
        if rate_times.len() < 2 {
            return Err(ModelError::PreconditionViolation(
                "at least two rate times are required".to_string(),
            ));
        }
        if rate_times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ModelError::PreconditionViolation(
                "rate times must be strictly increasing".to_string(),
            ));
        }
        let taus: Vec<f64> = rate_times.windows(2).map(|w| w[1] - w[0]).collect();
        let n = taus.len();
        Ok(Self {
            rate_times,
            taus,
            forwards: vec![0.0; n],
            first_valid: 0,
            discount_ratios: OnceLock::new(),
            annuities: OnceLock::new(),
        })
    }

    /// Number of forward rates.
    #[inline]
    pub fn number_of_rates(&self) -> usize {
        self.taus.len()
    }

    /// Rate times `T_0 .. T_n`.
    #[inline]
    pub fn rate_times(&self) -> &[f64] {
        &self.rate_times
    }

    /// Accrual fractions `τ_0 .. τ_{n-1}`.
    #[inline]
    pub fn rate_taus(&self) -> &[f64] {
        &self.taus
    }

    /// Current forwards; entries below `first_valid` are stale.
    #[inline]
    pub fn forward_rates(&self) -> &[f64] {
        &self.forwards
    }

    /// First forward that is still alive.
    #[inline]
    pub fn first_valid(&self) -> usize {
        self.first_valid
    }

    /// Replaces the forwards from `first_valid` onwards and invalidates
    /// cached quantities.
    ///
    /// # Panics
    ///
    /// Panics if `forwards` is not of length `number_of_rates()` or
    /// `first_valid >= number_of_rates()`.
    pub fn set_on_forward_rates(&mut self, forwards: &[f64], first_valid: usize) {
        assert_eq!(forwards.len(), self.forwards.len(), "forward rate count");
        assert!(first_valid < self.forwards.len(), "first valid index out of range");
        self.forwards[first_valid..].copy_from_slice(&forwards[first_valid..]);
        self.first_valid = first_valid;
        self.discount_ratios = OnceLock::new();
        self.annuities = OnceLock::new();
    }

    /// Discount ratios `d_i = P(T_i) / P(T_n)` for `i ≥ first_valid`; earlier
    /// entries are zero.
    pub fn discount_ratios(&self) -> &[f64] {
        self.discount_ratios.get_or_init(|| {
            let n = self.forwards.len();
            let mut d = vec![0.0; n + 1];
            d[n] = 1.0;
            for i in (self.first_valid..n).rev() {
                d[i] = d[i + 1] * (1.0 + self.taus[i] * self.forwards[i]);
            }
            d
        })
    }

    /// `P(T_i) / P(T_j)` for alive indices.
    pub fn discount_ratio(&self, i: usize, j: usize) -> f64 {
        let d = self.discount_ratios();
        d[i] / d[j]
    }

    /// Coterminal annuities `A_i` in units of the terminal bond.
    pub fn coterminal_annuities(&self) -> &[f64] {
        self.annuities.get_or_init(|| {
            let n = self.forwards.len();
            let d = self.discount_ratios();
            let mut a = vec![0.0; n];
            let mut acc = 0.0;
            for i in (self.first_valid..n).rev() {
                acc += self.taus[i] * d[i + 1];
                a[i] = acc;
            }
            a
        })
    }

    /// Coterminal annuity `A_i`.
    pub fn coterminal_annuity(&self, i: usize) -> f64 {
        self.coterminal_annuities()[i]
    }

    /// Coterminal swap rate `S_i`.
    pub fn coterminal_swap_rate(&self, i: usize) -> f64 {
        let d = self.discount_ratios();
        let n = self.forwards.len();
        (d[i] - d[n]) / self.coterminal_annuity(i)
    }

    /// Whether the alive discount ratios are non-increasing in maturity,
    /// i.e. no negative simple forward is implied.
    pub fn is_monotone(&self) -> bool {
        self.discount_ratios()[self.first_valid..]
            .windows(2)
            .all(|w| w[0] >= w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn state(fwds: &[f64]) -> LmmCurveState {
        let times: Vec<f64> = (0..=fwds.len()).map(|i| 0.5 + 0.5 * i as f64).collect();
        let mut s = LmmCurveState::new(times).unwrap();
        s.set_on_forward_rates(fwds, 0);
        s
    }

    #[test]
    fn test_single_period_swap_rate_is_forward() {
        let s = state(&[0.03, 0.04, 0.05]);
        assert_relative_eq!(s.coterminal_swap_rate(2), 0.05, epsilon = 1e-14);
        assert_relative_eq!(s.coterminal_annuity(2), 0.5, epsilon = 1e-14);
    }

    #[test]
    fn test_flat_forwards_give_flat_swap_rates() {
        let s = state(&[0.04; 5]);
        for i in 0..5 {
            assert_relative_eq!(s.coterminal_swap_rate(i), 0.04, epsilon = 1e-13);
        }
        assert!(s.is_monotone());
    }

    #[test]
    fn test_cache_is_invalidated_on_update() {
        let mut s = state(&[0.04; 3]);
        let before = s.discount_ratio(0, 3);
        s.set_on_forward_rates(&[0.0, 0.06, 0.06], 1);
        assert_eq!(s.first_valid(), 1);
        assert_relative_eq!(s.discount_ratio(1, 3), 1.03 * 1.03, epsilon = 1e-14);
        assert!(s.discount_ratio(1, 3) != before);
    }

    #[test]
    fn test_negative_forward_breaks_monotonicity() {
        let s = state(&[0.04, -0.01, 0.04]);
        assert!(!s.is_monotone());
    }

    #[test]
    fn test_rejects_bad_rate_times() {
        assert!(LmmCurveState::new(vec![1.0]).is_err());
        assert!(LmmCurveState::new(vec![1.0, 1.0, 2.0]).is_err());
    }
}

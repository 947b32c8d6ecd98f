//! Halton low-discrepancy sequence.
//!
//! Dimension `d` uses the `d`-th prime as radical-inverse base. The origin is
//! skipped, so every coordinate lies strictly inside (0, 1) and maps to a
//! finite normal variate. Points are computed directly from their index, so
//! [`skip_to`](HaltonSequence::skip_to) is O(1) and substreams are exact.

use crate::mc::error::RngError;

/// Number of points a sequence supports before reporting exhaustion.
pub const HALTON_PERIOD: u64 = u32::MAX as u64;

/// First `n` primes.
fn first_primes(n: usize) -> Vec<u64> {
    let mut primes = Vec::with_capacity(n);
    let mut candidate = 2u64;
    while primes.len() < n {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

#[inline]
fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut result = 0.0;
    while index > 0 {
        result += (index % base) as f64 * factor;
        index /= base;
        factor *= inv_base;
    }
    result
}

/// Halton sequence generator in `[0, 1)^d`.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::rng::HaltonSequence;
///
/// let mut halton = HaltonSequence::new(2).unwrap();
/// let mut point = [0.0; 2];
/// halton.next_point(&mut point).unwrap();
/// assert_eq!(point, [0.5, 1.0 / 3.0]);
/// halton.next_point(&mut point).unwrap();
/// assert_eq!(point, [0.25, 2.0 / 3.0]);
/// ```
#[derive(Debug, Clone)]
pub struct HaltonSequence {
    bases: Vec<u64>,
    /// Index of the last point produced; the next point is `index + 1`
    index: u64,
}

impl HaltonSequence {
    /// Creates a sequence of the given dimension.
    pub fn new(dimension: usize) -> Result<Self, RngError> {
        if dimension == 0 {
            return Err(RngError::ZeroDimension);
        }
        Ok(Self {
            bases: first_primes(dimension),
            index: 0,
        })
    }

    /// Dimension of each point.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.bases.len()
    }

    /// Positions the sequence so the next point is the `(n + 1)`-th.
    pub fn skip_to(&mut self, n: u64) {
        self.index = n;
    }

    /// Writes the next point into `out`.
    ///
    /// # Errors
    ///
    /// [`RngError::PeriodExhausted`] past [`HALTON_PERIOD`] points.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != dimension()`.
    pub fn next_point(&mut self, out: &mut [f64]) -> Result<(), RngError> {
        assert_eq!(out.len(), self.bases.len(), "Halton point length");
        let next = self.index + 1;
        if next > HALTON_PERIOD {
            return Err(RngError::PeriodExhausted {
                requested: next,
                period: HALTON_PERIOD,
            });
        }
        for (value, &base) in out.iter_mut().zip(&self.bases) {
            *value = radical_inverse(next, base);
        }
        self.index = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primes() {
        assert_eq!(first_primes(8), vec![2, 3, 5, 7, 11, 13, 17, 19]);
    }

    #[test]
    fn test_skip_to_matches_sequential_draws() {
        let mut sequential = HaltonSequence::new(5).unwrap();
        let mut point = [0.0; 5];
        for _ in 0..100 {
            sequential.next_point(&mut point).unwrap();
        }
        let mut skipped = HaltonSequence::new(5).unwrap();
        skipped.skip_to(99);
        let mut other = [0.0; 5];
        skipped.next_point(&mut other).unwrap();
        assert_eq!(point, other);
    }

    #[test]
    fn test_points_strictly_inside_unit_cube() {
        let mut halton = HaltonSequence::new(30).unwrap();
        let mut point = vec![0.0; 30];
        for _ in 0..1000 {
            halton.next_point(&mut point).unwrap();
            assert!(point.iter().all(|&u| u > 0.0 && u < 1.0));
        }
    }

    #[test]
    fn test_period_exhaustion() {
        let mut halton = HaltonSequence::new(1).unwrap();
        halton.skip_to(HALTON_PERIOD);
        let mut point = [0.0];
        assert_eq!(
            halton.next_point(&mut point),
            Err(RngError::PeriodExhausted {
                requested: HALTON_PERIOD + 1,
                period: HALTON_PERIOD
            })
        );
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert_eq!(HaltonSequence::new(0).unwrap_err(), RngError::ZeroDimension);
    }
}

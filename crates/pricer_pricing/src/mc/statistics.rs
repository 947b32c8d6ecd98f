//! Sample accumulators.
//!
//! [`Statistics`] keeps a weighted running mean and second moment with
//! Welford's update, so a single pass over millions of samples stays
//! numerically stable. Partial accumulators from parallel batches combine
//! with [`merge`](SampleAccumulator::merge) (Chan et al.), which is how the
//! simulation reduces batch results without a shared lock.
//!
//! The variance carries the `n / (n - 1)` small-sample correction and the
//! error estimate is `sqrt(variance / n)`.

/// Accumulator of weighted samples used by the simulation loop.
///
/// Implementations must be mergeable: accumulating two halves separately and
/// merging gives the same statistics as accumulating the whole.
pub trait SampleAccumulator: Default + Clone + Send {
    /// Adds one sample with a positive weight.
    fn add(&mut self, value: f64, weight: f64);

    /// Folds in the samples of `other`.
    fn merge(&mut self, other: &Self);

    /// Number of samples.
    fn samples(&self) -> usize;

    /// Weighted mean, zero when empty.
    fn mean(&self) -> f64;

    /// Standard error of the mean.
    fn error_estimate(&self) -> f64;
}

/// Weighted mean, variance and range.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::mc::{SampleAccumulator, Statistics};
///
/// let mut stats = Statistics::default();
/// for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
///     stats.add(x, 1.0);
/// }
/// assert_eq!(stats.mean(), 3.0);
/// assert!((stats.variance() - 2.5).abs() < 1e-15);
/// assert!((stats.error_estimate() - 0.5_f64.sqrt()).abs() < 1e-15);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    samples: usize,
    weight_sum: f64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            samples: 0,
            weight_sum: 0.0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Statistics {
    /// Sum of the weights.
    #[inline]
    pub fn weight_sum(&self) -> f64 {
        self.weight_sum
    }

    /// Unbiased variance; zero with fewer than two samples.
    pub fn variance(&self) -> f64 {
        if self.samples < 2 || self.weight_sum <= 0.0 {
            return 0.0;
        }
        let n = self.samples as f64;
        (self.m2 / self.weight_sum * n / (n - 1.0)).max(0.0)
    }

    /// Square root of [`variance`](Self::variance).
    pub fn standard_deviation(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Smallest sample, `+inf` when empty.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest sample, `-inf` when empty.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Clears all samples.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl SampleAccumulator for Statistics {
    #[inline]
    fn add(&mut self, value: f64, weight: f64) {
        debug_assert!(weight > 0.0, "sample weight must be positive");
        self.samples += 1;
        let total = self.weight_sum + weight;
        let delta = value - self.mean;
        self.mean += weight / total * delta;
        self.m2 += weight * delta * (value - self.mean);
        self.weight_sum = total;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn merge(&mut self, other: &Self) {
        if other.samples == 0 {
            return;
        }
        if self.samples == 0 {
            *self = other.clone();
            return;
        }
        let total = self.weight_sum + other.weight_sum;
        let delta = other.mean - self.mean;
        self.mean += delta * other.weight_sum / total;
        self.m2 += other.m2 + delta * delta * self.weight_sum * other.weight_sum / total;
        self.weight_sum = total;
        self.samples += other.samples;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    #[inline]
    fn samples(&self) -> usize {
        self.samples
    }

    #[inline]
    fn mean(&self) -> f64 {
        self.mean
    }

    fn error_estimate(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.variance() / self.samples as f64).sqrt()
    }
}

/// [`Statistics`] that also records the running mean each time the sample
/// count reaches a power of two, for convergence plots.
///
/// With batched accumulation the table is recorded at merge boundaries, so
/// an entry's sample count is the first count at or past the power of two.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergenceStatistics {
    inner: Statistics,
    table: Vec<(usize, f64)>,
    next_threshold: usize,
}

impl ConvergenceStatistics {
    /// Recorded `(samples, mean)` pairs.
    pub fn convergence_table(&self) -> &[(usize, f64)] {
        &self.table
    }

    /// Underlying statistics.
    pub fn statistics(&self) -> &Statistics {
        &self.inner
    }

    fn record(&mut self) {
        let threshold = self.next_threshold.max(1);
        if self.inner.samples() >= threshold {
            self.table.push((self.inner.samples(), self.inner.mean()));
            let mut next = threshold;
            while next <= self.inner.samples() {
                next *= 2;
            }
            self.next_threshold = next;
        }
    }
}

impl SampleAccumulator for ConvergenceStatistics {
    fn add(&mut self, value: f64, weight: f64) {
        self.inner.add(value, weight);
        self.record();
    }

    fn merge(&mut self, other: &Self) {
        self.inner.merge(&other.inner);
        self.record();
    }

    fn samples(&self) -> usize {
        self.inner.samples()
    }

    fn mean(&self) -> f64 {
        self.inner.mean()
    }

    fn error_estimate(&self) -> f64 {
        self.inner.error_estimate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_samples() {
        let mut stats = Statistics::default();
        for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.add(x, 1.0);
        }
        assert_eq!(stats.samples(), 5);
        assert_relative_eq!(stats.mean(), 3.0);
        let std = (10.0_f64 / 4.0).sqrt();
        assert_relative_eq!(stats.standard_deviation(), std, epsilon = 1e-15);
        assert_relative_eq!(stats.error_estimate(), std / 5.0_f64.sqrt(), epsilon = 1e-15);
        assert_eq!(stats.min(), 1.0);
        assert_eq!(stats.max(), 5.0);
    }

    #[test]
    fn test_weights_act_as_repetition() {
        let mut weighted = Statistics::default();
        weighted.add(1.0, 3.0);
        weighted.add(5.0, 1.0);
        let mut repeated = Statistics::default();
        for x in [1.0, 1.0, 1.0, 5.0] {
            repeated.add(x, 1.0);
        }
        assert_relative_eq!(weighted.mean(), repeated.mean(), epsilon = 1e-15);
        assert_eq!(weighted.weight_sum(), 4.0);
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let xs: Vec<f64> = (0..101).map(|i| ((i * 37) % 17) as f64 - 3.5).collect();
        let mut whole = Statistics::default();
        xs.iter().for_each(|&x| whole.add(x, 1.0));

        let mut left = Statistics::default();
        let mut right = Statistics::default();
        xs[..40].iter().for_each(|&x| left.add(x, 1.0));
        xs[40..].iter().for_each(|&x| right.add(x, 1.0));
        left.merge(&right);

        assert_eq!(left.samples(), whole.samples());
        assert_relative_eq!(left.mean(), whole.mean(), epsilon = 1e-12);
        assert_relative_eq!(left.variance(), whole.variance(), epsilon = 1e-12);
        assert_eq!(left.min(), whole.min());
    }

    #[test]
    fn test_empty_and_single_sample() {
        let mut stats = Statistics::default();
        assert_eq!(stats.mean(), 0.0);
        assert_eq!(stats.error_estimate(), 0.0);
        stats.add(4.0, 1.0);
        assert_eq!(stats.variance(), 0.0);
        stats.merge(&Statistics::default());
        assert_eq!(stats.samples(), 1);
        stats.reset();
        assert_eq!(stats.samples(), 0);
    }

    #[test]
    fn test_convergence_table_at_powers_of_two() {
        let mut stats = ConvergenceStatistics::default();
        for i in 0..10 {
            stats.add(i as f64, 1.0);
        }
        let counts: Vec<usize> = stats.convergence_table().iter().map(|e| e.0).collect();
        assert_eq!(counts, vec![1, 2, 4, 8]);
        assert_relative_eq!(stats.convergence_table()[2].1, 1.5);
    }
}

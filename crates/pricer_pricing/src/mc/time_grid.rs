//! Simulation time grid.
//!
//! A [`TimeGrid`] starts at zero and contains every mandatory time (fixing,
//! exercise or payment times expressed as year fractions) exactly once.
//! Between consecutive mandatory times it inserts evenly spaced sub-steps no
//! wider than `dt_max`:
//!
//! - `dt_max = last / steps` when a step count is requested
//! - otherwise `dt_max` is the smallest gap between mandatory times (the gap
//!   from zero included), so the grid is just the mandatory times
//!
//! Each period `[a, b]` is split into `max(round((b - a) / dt_max), 1)`
//! equal steps, the last of which ends exactly on `b`.

use super::error::TimeGridError;

#[inline]
fn close_enough(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-12 * (1.0 + a.abs().max(b.abs()))
}

/// Immutable, strictly increasing grid `0 = t_0 < t_1 < ... < t_n`.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::mc::TimeGrid;
///
/// let grid = TimeGrid::new(&[1.0, 0.5], 4).unwrap();
/// assert_eq!(grid.times(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(grid.index(0.5).unwrap(), 2);
/// assert_eq!(grid.mandatory_times(), &[0.5, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
    dt: Vec<f64>,
    mandatory: Vec<f64>,
}

impl TimeGrid {
    /// Builds a grid through the given mandatory times with roughly `steps`
    /// steps in total (or mandatory times only when `steps == 0`).
    ///
    /// Mandatory times are sorted and deduplicated; a mandatory time equal to
    /// zero up to rounding is absorbed by the grid origin.
    ///
    /// # Errors
    ///
    /// - [`TimeGridError::Empty`] without mandatory times
    /// - [`TimeGridError::NegativeTime`] for a negative time
    /// - [`TimeGridError::NonFinite`] for NaN or infinite times
    pub fn new(mandatory_times: &[f64], steps: usize) -> Result<Self, TimeGridError> {
        if mandatory_times.is_empty() {
            return Err(TimeGridError::Empty);
        }
        if let Some(&t) = mandatory_times.iter().find(|t| !t.is_finite()) {
            return Err(TimeGridError::NonFinite(t));
        }

        let mut mandatory = mandatory_times.to_vec();
        mandatory.sort_by(f64::total_cmp);
        mandatory.dedup_by(|a, b| close_enough(*a, *b));

        if mandatory[0] < 0.0 {
            return Err(TimeGridError::NegativeTime(mandatory[0]));
        }
        if close_enough(mandatory[0], 0.0) {
            mandatory[0] = 0.0;
        }

        let last = mandatory[mandatory.len() - 1];
        if last == 0.0 {
            return Ok(Self {
                times: vec![0.0],
                dt: Vec::new(),
                mandatory,
            });
        }

        let dt_max = if steps == 0 {
            let mut previous = 0.0;
            let mut smallest = f64::INFINITY;
            for &t in &mandatory {
                let gap = t - previous;
                if gap > 0.0 {
                    smallest = smallest.min(gap);
                }
                previous = t;
            }
            smallest
        } else {
            last / steps as f64
        };

        let mut times = vec![0.0];
        let mut period_begin = 0.0;
        for &period_end in &mandatory {
            if period_end == 0.0 {
                continue;
            }
            let period = period_end - period_begin;
            let n_steps = ((period / dt_max).round() as usize).max(1);
            let dt = period / n_steps as f64;
            for n in 1..n_steps {
                times.push(period_begin + n as f64 * dt);
            }
            times.push(period_end);
            period_begin = period_end;
        }

        Ok(Self::from_times(times, mandatory))
    }

    /// Regular grid `i * end / steps`, `i = 0..=steps`.
    ///
    /// # Errors
    ///
    /// [`TimeGridError::InvalidRegularGrid`] unless `end > 0` and `steps > 0`.
    ///
    /// ```rust
    /// use pricer_pricing::mc::TimeGrid;
    ///
    /// let grid = TimeGrid::regular(1.0, 4).unwrap();
    /// assert_eq!(grid.len(), 5);
    /// assert!((grid.dt(1) - 0.25).abs() < 1e-15);
    /// ```
    pub fn regular(end: f64, steps: usize) -> Result<Self, TimeGridError> {
        if !(end.is_finite() && end > 0.0) || steps == 0 {
            return Err(TimeGridError::InvalidRegularGrid { end, steps });
        }
        let dt = end / steps as f64;
        let mut times: Vec<f64> = (0..steps).map(|i| i as f64 * dt).collect();
        times.push(end);
        Ok(Self::from_times(times, vec![end]))
    }

    fn from_times(times: Vec<f64>, mandatory: Vec<f64>) -> Self {
        let dt = times.windows(2).map(|w| w[1] - w[0]).collect();
        Self {
            times,
            dt,
            mandatory,
        }
    }

    /// Grid times, starting at zero.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of grid points (steps + 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always false: a grid holds at least the origin.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of steps.
    #[inline]
    pub fn steps(&self) -> usize {
        self.dt.len()
    }

    /// Time of grid point `i`.
    #[inline]
    pub fn time(&self, i: usize) -> f64 {
        self.times[i]
    }

    /// Last grid time.
    #[inline]
    pub fn last(&self) -> f64 {
        self.times[self.times.len() - 1]
    }

    /// Width of step `i`, from `t_i` to `t_{i+1}`.
    #[inline]
    pub fn dt(&self, i: usize) -> f64 {
        self.dt[i]
    }

    /// Sorted, deduplicated mandatory times.
    #[inline]
    pub fn mandatory_times(&self) -> &[f64] {
        &self.mandatory
    }

    /// Index of the grid point nearest to `t`. Ties go to the earlier point.
    pub fn closest_index(&self, t: f64) -> usize {
        let i = self.times.partition_point(|&x| x < t);
        if i == 0 {
            0
        } else if i == self.times.len() {
            self.times.len() - 1
        } else if t - self.times[i - 1] > self.times[i] - t {
            i
        } else {
            i - 1
        }
    }

    /// Index of the grid point equal to `t`.
    ///
    /// # Errors
    ///
    /// [`TimeGridError::NotOnGrid`] when no grid point matches `t`.
    pub fn index(&self, t: f64) -> Result<usize, TimeGridError> {
        let i = self.closest_index(t);
        if close_enough(self.times[i], t) {
            Ok(i)
        } else {
            Err(TimeGridError::NotOnGrid(t))
        }
    }
}

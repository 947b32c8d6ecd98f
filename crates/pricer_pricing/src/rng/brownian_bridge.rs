//! Brownian bridge construction on an arbitrary time grid.
//!
//! The first normal fixes the Brownian motion at the final time; each
//! following normal fills the midpoint of the largest remaining gap,
//! conditioned on its already-built neighbours. Low-discrepancy sequences put
//! their best-distributed coordinates first, so the bridge spends them on the
//! largest-scale features of the path.
//!
//! Output is the sequence of standardised increments
//! `(W(t_i) - W(t_{i-1})) / √(t_i - t_{i-1})`, i.i.d. standard normal, so
//! bridged and plain draws are interchangeable for the evolver.

/// Bridge over the times `t_1 < ... < t_n` (the start `t_0 = 0` is implicit).
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::rng::BrownianBridge;
///
/// let bridge = BrownianBridge::new(&[0.25, 0.5, 0.75, 1.0]);
/// let mut out = [0.0; 4];
/// bridge.transform(&[1.0, 0.0, 0.0, 0.0], &mut out);
/// // A single unit shock at maturity spreads evenly over the path
/// for z in out {
///     assert!((z - 0.5).abs() < 1e-12);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BrownianBridge {
    size: usize,
    sqrt_dt: Vec<f64>,
    bridge_index: Vec<usize>,
    left_index: Vec<usize>,
    right_index: Vec<usize>,
    left_weight: Vec<f64>,
    right_weight: Vec<f64>,
    std_dev: Vec<f64>,
}

impl BrownianBridge {
    /// Builds the bridge for strictly increasing positive times.
    ///
    /// # Panics
    ///
    /// Panics if `times` is empty.
    pub fn new(times: &[f64]) -> Self {
        let size = times.len();
        assert!(size > 0, "Brownian bridge needs at least one time");

        let sqrt_dt = times
            .iter()
            .enumerate()
            .map(|(i, &t)| (t - if i == 0 { 0.0 } else { times[i - 1] }).sqrt())
            .collect();

        let mut bridge_index = vec![0; size];
        let mut left_index = vec![0; size];
        let mut right_index = vec![0; size];
        let mut left_weight = vec![0.0; size];
        let mut right_weight = vec![0.0; size];
        let mut std_dev = vec![0.0; size];

        // map[i] != 0 once point i is built; values are build order + 1
        let mut map = vec![0usize; size];
        map[size - 1] = 1;
        bridge_index[0] = size - 1;
        std_dev[0] = times[size - 1].sqrt();

        let mut j = 0;
        for i in 1..size {
            while map[j] != 0 {
                j += 1;
            }
            let mut k = j;
            while map[k] == 0 {
                k += 1;
            }
            // points j..k-1 are unbuilt; fill the middle one
            let l = j + ((k - 1 - j) >> 1);
            map[l] = i + 1;
            bridge_index[i] = l;
            left_index[i] = j;
            right_index[i] = k;
            if j != 0 {
                let t_left = times[j - 1];
                left_weight[i] = (times[k] - times[l]) / (times[k] - t_left);
                right_weight[i] = (times[l] - t_left) / (times[k] - t_left);
                std_dev[i] = ((times[l] - t_left) * (times[k] - times[l]) / (times[k] - t_left)).sqrt();
            } else {
                left_weight[i] = (times[k] - times[l]) / times[k];
                right_weight[i] = times[l] / times[k];
                std_dev[i] = (times[l] * (times[k] - times[l]) / times[k]).sqrt();
            }
            j = k + 1;
            if j >= size {
                j = 0;
            }
        }

        Self {
            size,
            sqrt_dt,
            bridge_index,
            left_index,
            right_index,
            left_weight,
            right_weight,
            std_dev,
        }
    }

    /// Number of time points.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Maps i.i.d. normals `z` to standardised Brownian increments in `out`.
    ///
    /// # Panics
    ///
    /// Panics if either slice length differs from `size()`.
    pub fn transform(&self, z: &[f64], out: &mut [f64]) {
        assert_eq!(z.len(), self.size, "bridge input length");
        assert_eq!(out.len(), self.size, "bridge output length");

        out[self.size - 1] = self.std_dev[0] * z[0];
        for i in 1..self.size {
            let j = self.left_index[i];
            let k = self.right_index[i];
            let l = self.bridge_index[i];
            out[l] = if j != 0 {
                self.left_weight[i] * out[j - 1] + self.right_weight[i] * out[k] + self.std_dev[i] * z[i]
            } else {
                self.right_weight[i] * out[k] + self.std_dev[i] * z[i]
            };
        }

        for i in (1..self.size).rev() {
            out[i] -= out[i - 1];
        }
        for (value, s) in out.iter_mut().zip(&self.sqrt_dt) {
            *value /= s;
        }
    }
}

//! Path pricers.
//!
//! A [`PathPricer`] maps one simulated path to the discounted value of the
//! cash flows it generates. Pricers are shared by every worker thread of a
//! simulation, so they are `Send + Sync` and take `&self`.

use super::path::MultiPath;

/// Discounted payoff of a single path.
///
/// Closures implement the trait, which keeps ad hoc pricers short:
///
/// ```rust
/// use std::sync::Arc;
/// use pricer_pricing::mc::{MultiPath, PathPricer, TimeGrid};
///
/// let terminal = |path: &MultiPath| path.value(path.len() - 1, 0);
/// let grid = Arc::new(TimeGrid::regular(1.0, 1).unwrap());
/// let mut path = MultiPath::new(grid, 1);
/// path.state_mut(1)[0] = 3.0;
/// assert_eq!(terminal.price(&path), 3.0);
/// ```
pub trait PathPricer: Send + Sync {
    /// Discounted value of the path's cash flows.
    fn price(&self, path: &MultiPath) -> f64;
}

impl<F> PathPricer for F
where
    F: Fn(&MultiPath) -> f64 + Send + Sync,
{
    #[inline]
    fn price(&self, path: &MultiPath) -> f64 {
        self(path)
    }
}

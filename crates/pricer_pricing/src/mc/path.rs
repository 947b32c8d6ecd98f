//! Simulated paths.
//!
//! A [`MultiPath`] holds the state vector of a process at every point of a
//! [`TimeGrid`], stored row-major: the `size()` state variables at grid
//! point `i` are contiguous. Paths are produced fresh by the path generator
//! for every draw and carry a shared reference to their grid.

use std::sync::Arc;

use super::time_grid::TimeGrid;

/// Process states along a time grid.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use pricer_pricing::mc::{MultiPath, TimeGrid};
///
/// let grid = Arc::new(TimeGrid::regular(1.0, 2).unwrap());
/// let mut path = MultiPath::new(grid, 2);
/// path.state_mut(1).copy_from_slice(&[100.0, 0.04]);
/// assert_eq!(path.state(1), &[100.0, 0.04]);
/// assert_eq!(path.value(1, 0), 100.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPath {
    grid: Arc<TimeGrid>,
    size: usize,
    data: Vec<f64>,
}

impl MultiPath {
    /// Zero-filled path of `size` state variables on `grid`.
    pub fn new(grid: Arc<TimeGrid>, size: usize) -> Self {
        let data = vec![0.0; grid.len() * size];
        Self { grid, size, data }
    }

    /// Time grid of the path.
    #[inline]
    pub fn time_grid(&self) -> &TimeGrid {
        &self.grid
    }

    /// Number of state variables.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of grid points.
    #[inline]
    pub fn len(&self) -> usize {
        self.grid.len()
    }

    /// True for a path without grid points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// State at grid point `i`.
    #[inline]
    pub fn state(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    /// Mutable state at grid point `i`.
    #[inline]
    pub fn state_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.data[i * self.size..(i + 1) * self.size]
    }

    /// Variable `j` at grid point `i`.
    #[inline]
    pub fn value(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.size + j]
    }

    /// Values of variable `j` along the whole path.
    pub fn component(&self, j: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().skip(j).step_by(self.size).copied()
    }
}

/// A draw with its weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    /// The drawn value
    pub value: T,
    /// Weight of the draw, 1 for plain Monte Carlo
    pub weight: f64,
}

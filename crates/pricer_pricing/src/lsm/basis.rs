//! Regression basis systems.
//!
//! Orthogonal families are generated from their monic three-term recurrence
//!
//! ```text
//! p_0 = 1,  p_1 = x - α_0,  p_{n+1} = (x - α_n) p_n - β_n p_{n-1}
//! ```
//!
//! and, where the family has a weight function, multiplied by `sqrt(w(x))`
//! so that the basis functions themselves are orthogonal:
//!
//! | family     | α_n    | β_n (n ≥ 1)       | `sqrt(w(x))`       |
//! |------------|--------|-------------------|--------------------|
//! | Laguerre   | 2n + 1 | n²                | `exp(-x/2)`        |
//! | Hermite    | 0      | n / 2             | `exp(-x²/2)`       |
//! | Hyperbolic | 0      | (π/2)² n²         | `1/sqrt(cosh x)`   |
//! | Legendre   | 0      | n² / (4n² - 1)    | 1                  |
//! | Chebyshev  | 0      | 1/2, then 1/4     | 1                  |
//!
//! Chebyshev polynomials are left unweighted: their weight
//! `(1 - x²)^(-1/2)` is undefined outside `[-1, 1]`, where regression
//! states routinely fall.
//!
//! Multi-dimensional systems are products of one-dimensional functions with
//! total degree at most the order, the constant function first.

use std::f64::consts::FRAC_PI_2;

/// Polynomial family of a basis system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BasisKind {
    /// `1, x, x², ...`
    #[default]
    Monomial,
    /// Weighted Laguerre polynomials
    Laguerre,
    /// Weighted Hermite polynomials
    Hermite,
    /// Weighted hyperbolic polynomials
    Hyperbolic,
    /// Legendre polynomials
    Legendre,
    /// Chebyshev polynomials of the first kind
    Chebyshev,
}

impl BasisKind {
    fn alpha(&self, n: usize) -> f64 {
        match self {
            BasisKind::Laguerre => 2.0 * n as f64 + 1.0,
            _ => 0.0,
        }
    }

    fn beta(&self, n: usize) -> f64 {
        let k = n as f64;
        match self {
            BasisKind::Monomial => 0.0,
            BasisKind::Laguerre => k * k,
            BasisKind::Hermite => 0.5 * k,
            BasisKind::Hyperbolic => FRAC_PI_2 * FRAC_PI_2 * k * k,
            BasisKind::Legendre => k * k / (4.0 * k * k - 1.0),
            BasisKind::Chebyshev => {
                if n == 1 {
                    0.5
                } else {
                    0.25
                }
            }
        }
    }

    fn sqrt_weight(&self, x: f64) -> f64 {
        match self {
            BasisKind::Laguerre => (-0.5 * x).exp(),
            BasisKind::Hermite => (-0.5 * x * x).exp(),
            BasisKind::Hyperbolic => 1.0 / x.cosh().sqrt(),
            _ => 1.0,
        }
    }

    /// Writes `p_0(x) .. p_order(x)`, weighted, into `out`.
    fn fill(&self, x: f64, out: &mut [f64]) {
        let Some(first) = out.first_mut() else {
            return;
        };
        *first = 1.0;
        if out.len() > 1 {
            out[1] = x - self.alpha(0);
        }
        for n in 1..out.len().saturating_sub(1) {
            out[n + 1] = (x - self.alpha(n)) * out[n] - self.beta(n) * out[n - 1];
        }
        let w = self.sqrt_weight(x);
        if w != 1.0 {
            out.iter_mut().for_each(|v| *v *= w);
        }
    }
}

/// Ordered, fixed set of regression functions of a state vector.
///
/// # Examples
///
/// ```rust
/// use pricer_pricing::lsm::{BasisKind, BasisSystem};
///
/// let basis = BasisSystem::new(BasisKind::Monomial, 2, 2);
/// assert_eq!(basis.len(), 6); // 1, x, y, x², xy, y²
/// assert_eq!(basis.values(&[2.0, 3.0]), vec![1.0, 2.0, 3.0, 4.0, 6.0, 9.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BasisSystem {
    kind: BasisKind,
    order: usize,
    dimension: usize,
    exponents: Vec<Vec<usize>>,
}

impl BasisSystem {
    /// Basis of total degree at most `order` in `dimension` variables.
    ///
    /// # Panics
    ///
    /// Panics if `dimension == 0`.
    pub fn new(kind: BasisKind, order: usize, dimension: usize) -> Self {
        assert!(dimension > 0, "basis dimension must be positive");
        let mut exponents = Vec::new();
        for degree in 0..=order {
            let mut current = vec![0; dimension];
            push_with_degree(&mut exponents, &mut current, 0, degree);
        }
        Self {
            kind,
            order,
            dimension,
            exponents,
        }
    }

    /// One-dimensional basis `p_0 .. p_order`.
    pub fn univariate(kind: BasisKind, order: usize) -> Self {
        Self::new(kind, order, 1)
    }

    /// Polynomial family.
    #[inline]
    pub fn kind(&self) -> BasisKind {
        self.kind
    }

    /// Maximum total degree.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of state variables.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of basis functions.
    #[inline]
    pub fn len(&self) -> usize {
        self.exponents.len()
    }

    /// Never true: the constant function is always present.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.exponents.is_empty()
    }

    /// Evaluates every basis function at `x` into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != dimension()` or `out.len() != len()`.
    pub fn evaluate(&self, x: &[f64], out: &mut [f64]) {
        assert_eq!(x.len(), self.dimension, "basis state length");
        assert_eq!(out.len(), self.exponents.len(), "basis output length");
        let stride = self.order + 1;
        let mut table = vec![0.0; self.dimension * stride];
        for (d, &xd) in x.iter().enumerate() {
            self.kind.fill(xd, &mut table[d * stride..(d + 1) * stride]);
        }
        for (value, powers) in out.iter_mut().zip(&self.exponents) {
            *value = powers
                .iter()
                .enumerate()
                .map(|(d, &p)| table[d * stride + p])
                .product();
        }
    }

    /// Basis values at `x` as a new vector.
    pub fn values(&self, x: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.len()];
        self.evaluate(x, &mut out);
        out
    }
}

fn push_with_degree(out: &mut Vec<Vec<usize>>, current: &mut Vec<usize>, var: usize, left: usize) {
    if var + 1 == current.len() {
        current[var] = left;
        out.push(current.clone());
        return;
    }
    for p in (0..=left).rev() {
        current[var] = p;
        push_with_degree(out, current, var + 1, left - p);
    }
    current[var] = 0;
}

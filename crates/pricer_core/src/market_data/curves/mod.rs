//! Discounting abstractions consumed by the Monte Carlo core.
//!
//! This module provides:
//! - [`YieldCurve`]: Generic trait for discount factor and rate calculations
//! - [`FlatCurve`]: Constant rate yield curve implementation

mod flat;

pub use flat::FlatCurve;

use crate::market_data::error::MarketDataError;
use num_traits::Float;

/// Generic yield curve trait for discount factor and rate calculations.
///
/// # Contract
///
/// - `discount_factor(t)` returns the discount factor D(t) for maturity t
/// - `zero_rate(t)` returns the continuously compounded zero rate r(t)
/// - `forward_rate(t1, t2)` returns the continuously compounded forward rate
/// - `simple_forward_rate(t1, t2)` returns the simply compounded forward rate
///   used as the initial state of a LIBOR market model
///
/// # Invariants
///
/// - D(0) = 1
/// - D(t) > 0 for all t >= 0
///
/// # Example
///
/// ```
/// use pricer_core::market_data::curves::{YieldCurve, FlatCurve};
///
/// let curve = FlatCurve::new(0.05_f64);
/// let df = curve.discount_factor(1.0).unwrap();
/// assert!((df - 0.951229).abs() < 1e-5);
///
/// let fwd = curve.simple_forward_rate(1.0, 1.5).unwrap();
/// assert!((fwd - ((0.025_f64).exp() - 1.0) / 0.5).abs() < 1e-12);
/// ```
pub trait YieldCurve<T: Float> {
    /// Return the discount factor for maturity `t`.
    ///
    /// # Errors
    ///
    /// `MarketDataError::InvalidMaturity` if `t < 0`.
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError>;

    /// Return the continuously compounded zero rate for maturity `t > 0`.
    fn zero_rate(&self, t: T) -> Result<T, MarketDataError> {
        if t <= T::zero() {
            return Err(MarketDataError::InvalidMaturity {
                t: t.to_f64().unwrap_or(0.0),
            });
        }
        let df = self.discount_factor(t)?;
        Ok(-df.ln() / t)
    }

    /// Return the continuously compounded forward rate between `t1` and `t2`.
    fn forward_rate(&self, t1: T, t2: T) -> Result<T, MarketDataError> {
        let dt = checked_period(t1, t2)?;
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        Ok((df1 / df2).ln() / dt)
    }

    /// Return the simply compounded forward rate between `t1` and `t2`.
    ///
    /// ```text
    /// F(t1, t2) = (D(t1) / D(t2) - 1) / (t2 - t1)
    /// ```
    fn simple_forward_rate(&self, t1: T, t2: T) -> Result<T, MarketDataError> {
        let dt = checked_period(t1, t2)?;
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        Ok((df1 / df2 - T::one()) / dt)
    }
}

fn checked_period<T: Float>(t1: T, t2: T) -> Result<T, MarketDataError> {
    let dt = t2 - t1;
    if dt <= T::zero() {
        return Err(MarketDataError::InvalidMaturity {
            t: dt.to_f64().unwrap_or(0.0),
        });
    }
    Ok(dt)
}

impl<T: Float, C: YieldCurve<T> + ?Sized> YieldCurve<T> for std::sync::Arc<C> {
    fn discount_factor(&self, t: T) -> Result<T, MarketDataError> {
        (**self).discount_factor(t)
    }
}

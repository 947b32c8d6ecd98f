//! Pricing context threaded through every engine call.
//!
//! A [`PricingContext`] carries what used to be ambient global state: the
//! valuation date, the day count turning dates into simulation times, and the
//! discount curve. The curve lives behind a versioned
//! [`Handle`](pricer_core::market_data::handle::Handle), and the context
//! exposes a [`ContextStamp`] so memoised results can tell when any of the
//! three changed.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use pricer_core::market_data::curves::FlatCurve;
//! use pricer_core::types::{Date, DayCountConvention};
//! use pricer_pricing::context::PricingContext;
//!
//! let today = Date::from_ymd(2024, 1, 2).unwrap();
//! let mut ctx = PricingContext::flat(today, DayCountConvention::Act365Fixed, 0.05);
//! let stamp = ctx.stamp();
//!
//! let expiry = today.add_days(365);
//! assert!((ctx.year_fraction(expiry) - 1.0).abs() < 1e-12);
//! assert!((ctx.discount(1.0).unwrap() - (-0.05_f64).exp()).abs() < 1e-15);
//!
//! ctx.relink_discount_curve(Arc::new(FlatCurve::new(0.04)));
//! assert_ne!(ctx.stamp(), stamp);
//! ```

use std::fmt;
use std::sync::Arc;

use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
use pricer_core::market_data::handle::Handle;
use pricer_core::market_data::MarketDataError;
use pricer_core::types::{Date, DayCountConvention};

/// Discount curve as shared by pricing contexts.
pub type DiscountCurve = dyn YieldCurve<f64> + Send + Sync;

/// Identity of a context's inputs: equal stamps mean equal inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextStamp {
    /// Valuation date
    pub valuation_date: Date,
    /// Day count convention
    pub day_count: DayCountConvention,
    /// Version of the linked discount curve
    pub curve_version: u64,
}

/// Valuation date, day count and discount curve of a pricing call.
#[derive(Clone)]
pub struct PricingContext {
    valuation_date: Date,
    day_count: DayCountConvention,
    discount_curve: Handle<DiscountCurve>,
}

impl PricingContext {
    /// Creates a context.
    pub fn new(
        valuation_date: Date,
        day_count: DayCountConvention,
        discount_curve: Handle<DiscountCurve>,
    ) -> Self {
        Self {
            valuation_date,
            day_count,
            discount_curve,
        }
    }

    /// Context discounting on a flat continuously compounded rate.
    pub fn flat(valuation_date: Date, day_count: DayCountConvention, rate: f64) -> Self {
        let curve: Arc<DiscountCurve> = Arc::new(FlatCurve::new(rate));
        Self::new(valuation_date, day_count, Handle::from_arc(curve))
    }

    /// Valuation date.
    #[inline]
    pub fn valuation_date(&self) -> Date {
        self.valuation_date
    }

    /// Day count convention.
    #[inline]
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// Discount curve handle.
    #[inline]
    pub fn discount_curve(&self) -> &Handle<DiscountCurve> {
        &self.discount_curve
    }

    /// Moves the valuation date.
    pub fn set_valuation_date(&mut self, date: Date) {
        self.valuation_date = date;
    }

    /// Links a new discount curve, bumping the curve version.
    pub fn relink_discount_curve(&mut self, curve: Arc<DiscountCurve>) {
        self.discount_curve.relink_arc(curve);
    }

    /// Year fraction from the valuation date to `date`; negative for past
    /// dates.
    #[inline]
    pub fn year_fraction(&self, date: Date) -> f64 {
        self.day_count.year_fraction(self.valuation_date, date)
    }

    /// Discount factor to time `t`.
    pub fn discount(&self, t: f64) -> Result<f64, MarketDataError> {
        self.discount_curve.current().discount_factor(t)
    }

    /// Current input stamp.
    pub fn stamp(&self) -> ContextStamp {
        ContextStamp {
            valuation_date: self.valuation_date,
            day_count: self.day_count,
            curve_version: self.discount_curve.version(),
        }
    }
}

impl fmt::Debug for PricingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PricingContext")
            .field("valuation_date", &self.valuation_date)
            .field("day_count", &self.day_count)
            .field("curve_version", &self.discount_curve.version())
            .finish()
    }
}

//! Payoff definitions.
//!
//! Monte Carlo exercise decisions compare exercise values against fitted
//! continuation values, so payoffs here are the exact kinked functions, not
//! smoothed approximations.

use super::error::InstrumentError;

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OptionType {
    /// Right to buy
    Call,
    /// Right to sell
    Put,
}

impl OptionType {
    /// +1 for calls, -1 for puts.
    #[inline]
    pub fn sign(&self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

/// Plain vanilla payoff `max(±(S - K), 0)`.
///
/// # Examples
/// ```
/// use pricer_models::instruments::{OptionType, PlainVanillaPayoff};
///
/// let put = PlainVanillaPayoff::new(OptionType::Put, 40.0).unwrap();
/// assert_eq!(put.value(36.0), 4.0);
/// assert_eq!(put.value(44.0), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlainVanillaPayoff {
    option_type: OptionType,
    strike: f64,
}

impl PlainVanillaPayoff {
    /// Creates a payoff; the strike must be finite and non-negative.
    pub fn new(option_type: OptionType, strike: f64) -> Result<Self, InstrumentError> {
        if !strike.is_finite() || strike < 0.0 {
            return Err(InstrumentError::InvalidStrike { strike });
        }
        Ok(Self {
            option_type,
            strike,
        })
    }

    /// Call or put.
    #[inline]
    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    /// Strike.
    #[inline]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    /// Payoff for an underlying level.
    #[inline]
    pub fn value(&self, underlying: f64) -> f64 {
        (self.option_type.sign() * (underlying - self.strike)).max(0.0)
    }
}

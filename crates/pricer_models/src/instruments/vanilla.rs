//! Vanilla options: a plain payoff with European, American or Bermudan
//! exercise.

use super::exercise::Exercise;
use super::payoff::PlainVanillaPayoff;

/// Vanilla option.
///
/// # Examples
/// ```
/// use pricer_core::types::Date;
/// use pricer_models::instruments::{Exercise, OptionType, PlainVanillaPayoff, VanillaOption};
///
/// let payoff = PlainVanillaPayoff::new(OptionType::Put, 40.0).unwrap();
/// let expiry = Date::from_ymd(2025, 1, 1).unwrap();
/// let option = VanillaOption::new(payoff, Exercise::european(expiry));
/// assert_eq!(option.payoff().strike(), 40.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VanillaOption {
    payoff: PlainVanillaPayoff,
    exercise: Exercise,
}

impl VanillaOption {
    /// Creates a vanilla option.
    pub fn new(payoff: PlainVanillaPayoff, exercise: Exercise) -> Self {
        Self { payoff, exercise }
    }

    /// The payoff.
    #[inline]
    pub fn payoff(&self) -> &PlainVanillaPayoff {
        &self.payoff
    }

    /// The exercise schedule.
    #[inline]
    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }
}

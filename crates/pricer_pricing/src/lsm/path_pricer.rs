//! Early-exercise products seen by the regression engine.

use pricer_core::market_data::{curves::YieldCurve, MarketDataError};

use super::basis::BasisSystem;
use crate::mc::{McError, MultiPath};

/// Exercise schedule of a product along a simulated path.
///
/// Exercise dates are numbered `0 .. number_of_exercises()`, all strictly
/// after the valuation date. Exercise values are expressed in the units of
/// their own date; [`ExerciseDiscounts`] moves them between dates.
pub trait EarlyExercisePathPricer: Send + Sync {
    /// Number of exercise dates, at least one.
    fn number_of_exercises(&self) -> usize;

    /// Writes the regression state at exercise `exercise` into `out`, whose
    /// length is the basis dimension.
    fn state(&self, path: &MultiPath, exercise: usize, out: &mut [f64]);

    /// Exercise value at exercise `exercise`; zero or less means out of the
    /// money.
    fn exercise_value(&self, path: &MultiPath, exercise: usize) -> f64;

    /// Regression functions of the state.
    fn basis_system(&self) -> &BasisSystem;
}

/// Discount factors between consecutive exercise dates and from the first
/// exercise date back to valuation.
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseDiscounts {
    between: Vec<f64>,
    to_valuation: f64,
}

impl ExerciseDiscounts {
    /// Creates the schedule; `between[e]` discounts from exercise `e + 1`
    /// to exercise `e`.
    ///
    /// # Errors
    ///
    /// [`McError::InvalidInput`] for a non-positive or non-finite factor.
    pub fn new(between: Vec<f64>, to_valuation: f64) -> Result<Self, McError> {
        if let Some(df) = between
            .iter()
            .chain(std::iter::once(&to_valuation))
            .find(|df| !(df.is_finite() && **df > 0.0))
        {
            return Err(McError::InvalidInput(format!(
                "discount factor {df} must be positive and finite"
            )));
        }
        Ok(Self {
            between,
            to_valuation,
        })
    }

    /// Discounts read off `curve` at the exercise times.
    ///
    /// # Errors
    ///
    /// Propagates curve failures and rejects an empty schedule.
    pub fn from_curve<C>(curve: &C, exercise_times: &[f64]) -> Result<Self, McError>
    where
        C: YieldCurve<f64> + ?Sized,
    {
        let factors = exercise_times
            .iter()
            .map(|&t| curve.discount_factor(t))
            .collect::<Result<Vec<_>, MarketDataError>>()?;
        let first = *factors
            .first()
            .ok_or_else(|| McError::InvalidInput("no exercise dates".to_string()))?;
        let between = factors.windows(2).map(|w| w[1] / w[0]).collect();
        Self::new(between, first)
    }

    /// Schedule for exercise values already expressed in numeraire units:
    /// unit factors between dates and `to_valuation` at the end.
    pub fn deflated(exercises: usize, to_valuation: f64) -> Result<Self, McError> {
        Self::new(vec![1.0; exercises.saturating_sub(1)], to_valuation)
    }

    /// Factor from exercise `exercise + 1` back to exercise `exercise`.
    #[inline]
    pub fn between(&self, exercise: usize) -> f64 {
        self.between[exercise]
    }

    /// Factor from the first exercise date back to valuation.
    #[inline]
    pub fn to_valuation(&self) -> f64 {
        self.to_valuation
    }

    /// Number of exercise dates the schedule covers.
    #[inline]
    pub fn exercises(&self) -> usize {
        self.between.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pricer_core::market_data::curves::FlatCurve;

    #[test]
    fn test_from_flat_curve() {
        let curve = FlatCurve::new(0.05);
        let d = ExerciseDiscounts::from_curve(&curve, &[0.5, 1.0, 2.0]).unwrap();
        assert_eq!(d.exercises(), 3);
        assert_relative_eq!(d.to_valuation(), (-0.025_f64).exp(), epsilon = 1e-14);
        assert_relative_eq!(d.between(0), (-0.025_f64).exp(), epsilon = 1e-14);
        assert_relative_eq!(d.between(1), (-0.05_f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn test_rejects_bad_factors() {
        assert!(ExerciseDiscounts::new(vec![1.0, 0.0], 0.9).is_err());
        assert!(ExerciseDiscounts::new(vec![], f64::NAN).is_err());
        assert!(ExerciseDiscounts::from_curve(&FlatCurve::new(0.01), &[]).is_err());
    }

    #[test]
    fn test_deflated_has_unit_steps() {
        let d = ExerciseDiscounts::deflated(4, 0.8).unwrap();
        assert_eq!(d.exercises(), 4);
        assert_eq!(d.between(2), 1.0);
        assert_eq!(d.to_valuation(), 0.8);
    }
}

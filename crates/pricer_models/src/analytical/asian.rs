//! Discrete geometric-average Asian option under Black-Scholes.
//!
//! The log of a discretely sampled geometric average of a log-normal
//! underlying is Gaussian, so the option prices with the Black formula. It
//! serves as the control variate for the arithmetic-average Monte Carlo
//! engine, whose payoff is highly correlated with it.
//!
//! For fixing times `t_0 < ... < t_{N-1}`:
//!
//! ```text
//! var = σ² / N² · (Σ t_i + 2 Σ_{k=0}^{N-2} t_k (N-1-k))
//! μ_G = ln S + (r - q - σ²/2) Σ t_i / N
//! F_G = exp(μ_G + var / 2)
//! ```

use super::black::black_formula;
use crate::instruments::OptionType;

/// Inputs of the discrete geometric Asian formula.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricAsianInputs<'a> {
    /// Call or put
    pub option_type: OptionType,
    /// Strike
    pub strike: f64,
    /// Spot of the underlying
    pub spot: f64,
    /// Continuously compounded risk-free rate
    pub rate: f64,
    /// Continuously compounded dividend yield
    pub dividend: f64,
    /// Black volatility
    pub volatility: f64,
    /// Future fixing times in years, ascending
    pub fixing_times: &'a [f64],
    /// Payment time in years
    pub maturity: f64,
}

/// Price of a discrete geometric-average-price Asian option.
///
/// Returns 0 when there are no fixings.
///
/// # Examples
/// ```
/// use pricer_models::analytical::{discrete_geometric_asian, GeometricAsianInputs};
/// use pricer_models::instruments::OptionType;
///
/// // A single fixing at maturity is a European option.
/// let fixings = [1.0];
/// let price = discrete_geometric_asian(&GeometricAsianInputs {
///     option_type: OptionType::Call,
///     strike: 100.0,
///     spot: 100.0,
///     rate: 0.05,
///     dividend: 0.0,
///     volatility: 0.2,
///     fixing_times: &fixings,
///     maturity: 1.0,
/// });
/// assert!((price - 10.450583572185565).abs() < 1e-9);
/// ```
pub fn discrete_geometric_asian(inputs: &GeometricAsianInputs<'_>) -> f64 {
    let times = inputs.fixing_times;
    if times.is_empty() {
        return 0.0;
    }
    let n = times.len() as f64;
    let time_sum: f64 = times.iter().sum();
    let cross: f64 = times
        .iter()
        .take(times.len() - 1)
        .enumerate()
        .map(|(k, &t)| t * (n - 1.0 - k as f64))
        .sum();

    let vol2 = inputs.volatility * inputs.volatility;
    let variance = vol2 / (n * n) * (time_sum + 2.0 * cross);
    let nu = inputs.rate - inputs.dividend - 0.5 * vol2;
    let mu_g = inputs.spot.ln() + nu * time_sum / n;
    let forward = (mu_g + 0.5 * variance).exp();
    let discount = (-inputs.rate * inputs.maturity).exp();

    black_formula(
        inputs.option_type,
        inputs.strike,
        forward,
        variance.sqrt(),
        discount,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_averaging_lowers_call_value() {
        let single = [1.0];
        let monthly: Vec<f64> = (1..=12).map(|i| i as f64 / 12.0).collect();
        let base = GeometricAsianInputs {
            option_type: OptionType::Call,
            strike: 100.0,
            spot: 100.0,
            rate: 0.03,
            dividend: 0.0,
            volatility: 0.3,
            fixing_times: &single,
            maturity: 1.0,
        };
        let european = discrete_geometric_asian(&base);
        let asian = discrete_geometric_asian(&GeometricAsianInputs {
            fixing_times: &monthly,
            ..base.clone()
        });
        assert!(asian < european);
        assert!(asian > 0.0);
    }

    #[test]
    fn test_no_fixings_is_worthless() {
        let inputs = GeometricAsianInputs {
            option_type: OptionType::Put,
            strike: 100.0,
            spot: 100.0,
            rate: 0.03,
            dividend: 0.0,
            volatility: 0.3,
            fixing_times: &[],
            maturity: 1.0,
        };
        assert_eq!(discrete_geometric_asian(&inputs), 0.0);
    }
}

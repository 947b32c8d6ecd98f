//! Black (1976) formula on forwards.
//!
//! The Monte Carlo core only needs closed forms as control-variate values
//! and benchmarks, so a single forward-based formula covers the European
//! control for American options, the geometric Asian control and the
//! forward-starting legs of a cliquet.
//!
//! ```text
//! call = D * (F N(d1) - K N(d2))
//! put  = D * (K N(-d2) - F N(-d1))
//! d1,2 = ln(F/K)/s ± s/2,   s = σ√T
//! ```

use super::distributions::norm_cdf;
use crate::instruments::OptionType;

/// Black price of a European option on a forward.
///
/// # Arguments
/// * `option_type` - Call or put
/// * `strike` - Strike (K >= 0)
/// * `forward` - Forward of the underlying (F > 0)
/// * `std_dev` - Total standard deviation σ√T (>= 0)
/// * `discount` - Discount factor to the payment date
///
/// Degenerate inputs (zero standard deviation or zero strike) return the
/// discounted intrinsic value.
///
/// # Examples
/// ```
/// use pricer_models::analytical::black_formula;
/// use pricer_models::instruments::OptionType;
///
/// let call = black_formula(OptionType::Call, 100.0, 100.0, 0.2, 1.0);
/// let put = black_formula(OptionType::Put, 100.0, 100.0, 0.2, 1.0);
/// // ATM forward: call == put
/// assert!((call - put).abs() < 1e-12);
/// assert!((call - 7.965567455405804).abs() < 1e-9);
/// ```
pub fn black_formula(
    option_type: OptionType,
    strike: f64,
    forward: f64,
    std_dev: f64,
    discount: f64,
) -> f64 {
    let sign = option_type.sign();
    if std_dev <= 0.0 || strike <= 0.0 {
        return discount * (sign * (forward - strike)).max(0.0);
    }
    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    let value = sign * (forward * norm_cdf(sign * d1) - strike * norm_cdf(sign * d2));
    discount * value.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_put_call_parity() {
        let (k, f, s, d) = (95.0, 102.0, 0.25, 0.97);
        let call = black_formula(OptionType::Call, k, f, s, d);
        let put = black_formula(OptionType::Put, k, f, s, d);
        assert_relative_eq!(call - put, d * (f - k), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_volatility_is_intrinsic() {
        assert_relative_eq!(black_formula(OptionType::Call, 90.0, 100.0, 0.0, 0.5), 5.0);
        assert_eq!(black_formula(OptionType::Put, 90.0, 100.0, 0.0, 0.5), 0.0);
    }

    #[test]
    fn test_black_scholes_reference() {
        // S=100, K=100, r=5%, q=0, σ=20%, T=1 -> 10.4506
        let r: f64 = 0.05;
        let forward = 100.0 * r.exp();
        let price = black_formula(OptionType::Call, 100.0, forward, 0.2, (-r).exp());
        assert_relative_eq!(price, 10.450_583_572_185_565, epsilon = 1e-9);
    }
}

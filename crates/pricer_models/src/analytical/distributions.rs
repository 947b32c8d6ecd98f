//! Standard normal distribution functions.
//!
//! This module provides:
//! - `norm_cdf`: Cumulative distribution function, Hart's double-precision
//!   rational approximation (absolute error below 1e-14)
//! - `norm_pdf`: Probability density function
//! - `inverse_norm_cdf`: Quantile function, Acklam's rational approximation
//!   polished by one Halley step against `norm_cdf`
//!
//! The inverse is what maps low-discrepancy uniforms onto Gaussian draws, so
//! it must stay accurate deep into the tails.

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// sqrt(2 * pi)
const SQRT_2PI: f64 = 2.506_628_274_631_000_2;

/// Standard normal probability density function.
///
/// # Examples
/// ```
/// use pricer_models::analytical::norm_pdf;
///
/// assert!((norm_pdf(0.0) - 0.3989422804014327).abs() < 1e-15);
/// ```
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal cumulative distribution function.
///
/// # Examples
/// ```
/// use pricer_models::analytical::norm_cdf;
///
/// assert!((norm_cdf(0.0) - 0.5).abs() < 1e-15);
/// assert!((norm_cdf(1.96) - 0.9750021048517795).abs() < 1e-13);
/// ```
pub fn norm_cdf(x: f64) -> f64 {
    let z = x.abs();
    let tail = if z > 37.0 {
        0.0
    } else {
        let e = (-0.5 * z * z).exp();
        if z < 7.071_067_811_865_47 {
            let mut num = 3.526_249_659_989_11e-2 * z + 0.700_383_064_443_688;
            num = num * z + 6.373_962_203_531_65;
            num = num * z + 33.912_866_078_383;
            num = num * z + 112.079_291_497_871;
            num = num * z + 221.213_596_169_931;
            num = num * z + 220.206_867_912_376;
            let mut den = 8.838_834_764_831_84e-2 * z + 1.755_667_163_182_64;
            den = den * z + 16.064_177_579_207;
            den = den * z + 86.780_732_202_946_1;
            den = den * z + 296.564_248_779_674;
            den = den * z + 637.333_633_378_831;
            den = den * z + 793.826_512_519_948;
            den = den * z + 440.413_735_824_752;
            e * num / den
        } else {
            let mut b = z + 0.65;
            b = z + 4.0 / b;
            b = z + 3.0 / b;
            b = z + 2.0 / b;
            b = z + 1.0 / b;
            e / b / SQRT_2PI
        }
    };
    if x > 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

const ACKLAM_A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_69e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const ACKLAM_B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
const ACKLAM_C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const ACKLAM_D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];
const P_LOW: f64 = 0.02425;

fn acklam_tail(q: f64) -> f64 {
    let c = &ACKLAM_C;
    let d = &ACKLAM_D;
    (((((c[0] * q + c[1]) * q + c[2]) * q + c[3]) * q + c[4]) * q + c[5])
        / ((((d[0] * q + d[1]) * q + d[2]) * q + d[3]) * q + 1.0)
}

/// Inverse of the standard normal cumulative distribution function.
///
/// Returns `-inf`/`+inf` at 0 and 1, NaN outside `[0, 1]`.
///
/// # Examples
/// ```
/// use pricer_models::analytical::{inverse_norm_cdf, norm_cdf};
///
/// let x = inverse_norm_cdf(0.975);
/// assert!((x - 1.959963984540054).abs() < 1e-12);
/// assert!((norm_cdf(inverse_norm_cdf(1e-10)) - 1e-10).abs() < 1e-20);
/// ```
pub fn inverse_norm_cdf(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }

    let x = if p < P_LOW {
        acklam_tail((-2.0 * p.ln()).sqrt())
    } else if p > 1.0 - P_LOW {
        -acklam_tail((-2.0 * (1.0 - p).ln()).sqrt())
    } else {
        let a = &ACKLAM_A;
        let b = &ACKLAM_B;
        let q = p - 0.5;
        let r = q * q;
        (((((a[0] * r + a[1]) * r + a[2]) * r + a[3]) * r + a[4]) * r + a[5]) * q
            / (((((b[0] * r + b[1]) * r + b[2]) * r + b[3]) * r + b[4]) * r + 1.0)
    };

    // Halley refinement
    let e = norm_cdf(x) - p;
    let u = e * SQRT_2PI * (0.5 * x * x).exp();
    x - u / (1.0 + 0.5 * x * u)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cdf_symmetry() {
        for &x in &[0.1, 0.5, 1.0, 2.5, 5.0, 8.0] {
            assert_relative_eq!(norm_cdf(x) + norm_cdf(-x), 1.0, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_cdf_reference_values() {
        assert_relative_eq!(norm_cdf(1.0), 0.841_344_746_068_542_9, epsilon = 1e-14);
        assert_relative_eq!(norm_cdf(-3.0), 0.001_349_898_031_630_094_6, epsilon = 1e-15);
        assert_eq!(norm_cdf(-40.0), 0.0);
        assert_eq!(norm_cdf(40.0), 1.0);
    }

    #[test]
    fn test_inverse_round_trip_across_regions() {
        for &p in &[1e-12, 1e-6, 0.01, 0.02425, 0.2, 0.5, 0.8, 0.99, 1.0 - 1e-9] {
            let x = inverse_norm_cdf(p);
            assert_relative_eq!(norm_cdf(x), p, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_inverse_edges() {
        assert_eq!(inverse_norm_cdf(0.0), f64::NEG_INFINITY);
        assert_eq!(inverse_norm_cdf(1.0), f64::INFINITY);
        assert!(inverse_norm_cdf(1.5).is_nan());
        assert_eq!(inverse_norm_cdf(0.5), 0.0);
    }
}

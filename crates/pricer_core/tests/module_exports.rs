//! Integration tests for module exports.
//!
//! Verifies that public modules and types are reachable via absolute paths
//! and interoperate the way downstream crates use them.

use std::sync::Arc;

/// Error types are reachable from both `types` and `types::error`.
#[test]
fn test_error_exports() {
    use pricer_core::types::error::PricingError;
    use pricer_core::types::DateError;

    let err = PricingError::InvalidInput("x".to_string());
    assert_eq!(err.to_string(), "Invalid input: x");
    assert!(matches!(
        pricer_core::types::Date::from_ymd(2024, 2, 30),
        Err(DateError::InvalidDate { .. })
    ));
}

/// Dates and day counts produce year fractions for grid construction.
#[test]
fn test_time_exports() {
    use pricer_core::types::{Date, DayCountConvention};

    let start: Date = "2024-01-15".parse().unwrap();
    let end = start.add_days(180);
    let act360 = DayCountConvention::Act360.year_fraction(start, end);
    assert!((act360 - 0.5).abs() < 1e-12);
    assert_eq!(end - start, 180);
}

/// Curves behind versioned handles can be shared across threads.
#[test]
fn test_curve_handle_exports() {
    use pricer_core::market_data::curves::{FlatCurve, YieldCurve};
    use pricer_core::market_data::Handle;

    let handle: Handle<dyn YieldCurve<f64> + Send + Sync> =
        Handle::from_arc(Arc::new(FlatCurve::new(0.03_f64)));
    let stamp = handle.version();

    let shared = handle.clone();
    let df = std::thread::spawn(move || shared.current().discount_factor(2.0).unwrap())
        .join()
        .unwrap();
    assert!((df - (-0.06_f64).exp()).abs() < 1e-15);
    assert_eq!(handle.version(), stamp);
}

/// Linear algebra kernels are reachable from `math`.
#[test]
fn test_linalg_exports() {
    use nalgebra::{DMatrix, DVector};
    use pricer_core::math::{least_squares, pseudo_sqrt, LinalgError};

    let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
    let y = DVector::from_vec(vec![1.0, 3.0, 5.0]);
    let beta = least_squares(&x, &y).unwrap();
    assert!((beta[0] - 1.0).abs() < 1e-12);
    assert!((beta[1] - 2.0).abs() < 1e-12);

    let not_square = DMatrix::<f64>::zeros(2, 3);
    assert!(matches!(
        pseudo_sqrt(&not_square),
        Err(LinalgError::NotSquare { .. })
    ));
}

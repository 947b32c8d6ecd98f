//! End-to-end engine behaviour.
//!
//! # Test Categories
//!
//! 1. **Stopping rules**: tolerance runs converge or report the cap
//! 2. **Determinism**: seeded runs repeat bit for bit across thread pools
//! 3. **Variance reduction**: control variates keep the mean and cut the error
//! 4. **Low discrepancy**: Halton runs carry no error estimate
//! 5. **Caching**: relinked processes and curves force recomputation

use std::sync::Arc;

use pricer_core::market_data::curves::FlatCurve;
use pricer_core::market_data::handle::Handle;
use pricer_core::types::{Date, DayCountConvention};
use pricer_models::analytical::black_formula;
use pricer_models::instruments::{
    AsianOption, CliquetKind, CliquetOption, OptionType, PlainVanillaPayoff,
};
use pricer_models::models::{BlackScholesProcess, HestonProcess, ProcessEnum};
use pricer_pricing::context::PricingContext;
use pricer_pricing::engines::{
    CachedEngine, MonteCarloAsianEngine, MonteCarloCliquetEngine, PricingEngine,
};
use pricer_pricing::mc::{ConfigError, McError, MonteCarloConfig};
use pricer_pricing::rng::RngKind;

fn today() -> Date {
    Date::from_ymd(2024, 3, 1).unwrap()
}

fn context() -> PricingContext {
    PricingContext::flat(today(), DayCountConvention::Act365Fixed, 0.05)
}

fn black_scholes() -> ProcessEnum {
    BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).unwrap().into()
}

fn monthly_asian(option_type: OptionType, strike: f64) -> AsianOption {
    let fixings: Vec<Date> = (1..=12).map(|m| today().add_days(m * 365 / 12)).collect();
    let payment = fixings[11];
    AsianOption::new(
        PlainVanillaPayoff::new(option_type, strike).unwrap(),
        fixings,
        payment,
    )
    .unwrap()
}

// ============================================================================
// Stopping rules
// ============================================================================

#[test]
fn test_tolerance_run_meets_tolerance() {
    let config = MonteCarloConfig::builder()
        .required_tolerance(0.05)
        .seed(9)
        .build()
        .unwrap();
    let engine = MonteCarloAsianEngine::new(Handle::new(black_scholes()), config).unwrap();
    let result = engine
        .calculate(&monthly_asian(OptionType::Call, 100.0), &context())
        .unwrap();
    assert!(result.error_estimate.unwrap() <= 0.05);
    assert!(result.samples >= 1023);
}

#[test]
fn test_tolerance_run_reports_cap() {
    let config = MonteCarloConfig::builder()
        .required_tolerance(1e-6)
        .max_samples(4096)
        .seed(9)
        .build()
        .unwrap();
    let engine = MonteCarloAsianEngine::new(Handle::new(black_scholes()), config).unwrap();
    match engine.calculate(&monthly_asian(OptionType::Call, 100.0), &context()) {
        Err(McError::NotConverged {
            samples,
            error_estimate,
            tolerance,
            ..
        }) => {
            assert_eq!(samples, 4096);
            assert!(error_estimate > tolerance);
        }
        other => panic!("expected NotConverged, got {other:?}"),
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_results_independent_of_thread_count() {
    let config = MonteCarloConfig::builder()
        .required_samples(10_000)
        .batch_size(512)
        .antithetic(true)
        .seed(31)
        .build()
        .unwrap();
    let engine = MonteCarloAsianEngine::new(Handle::new(black_scholes()), config).unwrap();
    let option = monthly_asian(OptionType::Put, 105.0);
    let ctx = context();

    let run = |threads: usize| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
            .install(|| engine.calculate(&option, &ctx).unwrap())
    };
    let single = run(1);
    let many = run(4);
    assert_eq!(single.value.to_bits(), many.value.to_bits());
    assert_eq!(single, many);
}

// ============================================================================
// Variance reduction
// ============================================================================

#[test]
fn test_geometric_control_variate_cuts_error() {
    let option = monthly_asian(OptionType::Call, 100.0);
    let price = |control_variate: bool| {
        let config = MonteCarloConfig::builder()
            .required_samples(8192)
            .control_variate(control_variate)
            .seed(14)
            .build()
            .unwrap();
        MonteCarloAsianEngine::new(Handle::new(black_scholes()), config)
            .unwrap()
            .calculate(&option, &context())
            .unwrap()
    };
    let plain = price(false);
    let controlled = price(true);
    let (e_plain, e_cv) = (plain.error_estimate.unwrap(), controlled.error_estimate.unwrap());
    assert!(e_cv < 0.2 * e_plain, "cv error {e_cv} vs plain {e_plain}");
    assert!((plain.value - controlled.value).abs() < 4.0 * (e_plain + e_cv));
}

#[test]
fn test_heston_without_control_variate_prices() {
    let heston: ProcessEnum = HestonProcess::new(100.0, 0.04, 2.0, 0.04, 0.3, -0.7, 0.05, 0.0)
        .unwrap()
        .into();
    let config = MonteCarloConfig::builder()
        .time_steps(48)
        .required_samples(4096)
        .seed(6)
        .build()
        .unwrap();
    let result = MonteCarloAsianEngine::new(Handle::new(heston), config)
        .unwrap()
        .calculate(&monthly_asian(OptionType::Call, 100.0), &context())
        .unwrap();
    // Asian call on v0 = theta = 0.04 sits well below the one-year European
    let european = black_formula(OptionType::Call, 100.0, 100.0 * 0.05_f64.exp(), 0.2, (-0.05_f64).exp());
    assert!(result.value > 0.0 && result.value < european);
}

// ============================================================================
// Low discrepancy
// ============================================================================

#[test]
fn test_halton_run_has_no_error_estimate() {
    let config = MonteCarloConfig::builder()
        .rng(RngKind::LowDiscrepancy)
        .brownian_bridge(true)
        .required_samples(4095)
        .build()
        .unwrap();
    let engine = MonteCarloAsianEngine::new(Handle::new(black_scholes()), config).unwrap();
    let result = engine
        .calculate(&monthly_asian(OptionType::Call, 100.0), &context())
        .unwrap();
    assert!(result.error_estimate.is_none());
    assert_eq!(result.samples, 4095);
    assert!(result.value > 3.0 && result.value < 7.0);
}

#[test]
fn test_halton_with_tolerance_rejected() {
    let err = MonteCarloConfig::builder()
        .rng(RngKind::LowDiscrepancy)
        .required_tolerance(0.01)
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::ToleranceWithLowDiscrepancy);
}

// ============================================================================
// Cliquet
// ============================================================================

#[test]
fn test_cliquet_single_period_is_european() {
    let option = CliquetOption::new(
        CliquetKind::Cliquet,
        OptionType::Put,
        1.0,
        vec![today()],
        today().add_days(365),
    )
    .unwrap();
    let config = MonteCarloConfig::builder()
        .antithetic(true)
        .required_samples(40_000)
        .seed(12)
        .build()
        .unwrap();
    let result = MonteCarloCliquetEngine::new(Handle::new(black_scholes()), config)
        .unwrap()
        .calculate(&option, &context())
        .unwrap();
    let forward = 100.0 * 0.05_f64.exp();
    let expected = black_formula(OptionType::Put, 100.0, forward, 0.2, (-0.05_f64).exp());
    let error = result.error_estimate.unwrap();
    assert!((result.value - expected).abs() < 4.0 * error, "{} vs {expected}", result.value);
}

// ============================================================================
// Caching
// ============================================================================

#[test]
fn test_cached_engine_follows_relinks() {
    let config = MonteCarloConfig::builder()
        .required_samples(2048)
        .seed(4)
        .build()
        .unwrap();
    let mut cached =
        CachedEngine::new(MonteCarloAsianEngine::new(Handle::new(black_scholes()), config).unwrap());
    let option = Handle::new(monthly_asian(OptionType::Call, 100.0));
    let mut ctx = context();

    let base = cached.calculate(&option, &ctx).unwrap();
    assert!(Arc::ptr_eq(&base, &cached.calculate(&option, &ctx).unwrap()));

    cached
        .engine_mut()
        .relink_process(BlackScholesProcess::new(100.0, 0.05, 0.0, 0.3).unwrap().into());
    let higher_vol = cached.calculate(&option, &ctx).unwrap();
    assert!(higher_vol.value > base.value);

    ctx.relink_discount_curve(Arc::new(FlatCurve::new(0.10)));
    let discounted = cached.calculate(&option, &ctx).unwrap();
    assert!(discounted.value < higher_vol.value);
    assert!(Arc::ptr_eq(&discounted, &cached.calculate(&option, &ctx).unwrap()));
}

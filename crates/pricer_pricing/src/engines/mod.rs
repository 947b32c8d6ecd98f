//! Monte Carlo pricing engines.
//!
//! Each engine owns a versioned handle to the simulated process and its
//! simulation settings, and prices one instrument type against a
//! [`PricingContext`]:
//!
//! | engine                          | instrument          | processes            |
//! |---------------------------------|---------------------|----------------------|
//! | [`MonteCarloAsianEngine`]       | `AsianOption`       | Black-Scholes, Heston |
//! | [`MonteCarloCliquetEngine`]     | `CliquetOption`     | Black-Scholes, Heston |
//! | [`MonteCarloAmericanEngine`]    | `VanillaOption`     | Black-Scholes, Heston |
//! | [`LmmBermudanSwaptionEngine`]   | `BermudanSwaption`  | LIBOR market model    |
//!
//! Analytic control variates need a Black-Scholes process; asking for one
//! with any other process is an error rather than a silent downgrade.
//! [`CachedEngine`] memoises any engine against the versions of its inputs.

mod american;
mod asian;
mod bermudan_swaption;
mod cache;
mod cliquet;

pub use american::MonteCarloAmericanEngine;
pub use asian::MonteCarloAsianEngine;
pub use bermudan_swaption::LmmBermudanSwaptionEngine;
pub use cache::CachedEngine;
pub use cliquet::MonteCarloCliquetEngine;

use tracing::debug;

use pricer_models::models::{BlackScholesProcess, ProcessEnum, StochasticProcess};

use crate::context::PricingContext;
use crate::lsm::LsmValuation;
use crate::mc::{
    McError, MonteCarloConfig, MonteCarloModel, MonteCarloSimulation, SampleAccumulator,
};
use crate::results::PricingResult;
use crate::rng::RngKind;

/// Key of the exercise probability in [`PricingResult::additional_results`].
pub const EXERCISE_PROBABILITY: &str = "exercise_probability";

/// Key of the in-sample calibration value in
/// [`PricingResult::additional_results`].
pub const CALIBRATION_VALUE: &str = "calibration_value";

/// Prices one instrument type.
pub trait PricingEngine: Send + Sync {
    /// Instrument priced by the engine.
    type Instrument: Send + Sync;

    /// Values `instrument` in `context`.
    ///
    /// # Errors
    ///
    /// Invalid instruments, unsupported processes, curve failures and
    /// [`McError::NotConverged`] when a tolerance run hits the sample cap.
    fn calculate(
        &self,
        instrument: &Self::Instrument,
        context: &PricingContext,
    ) -> Result<PricingResult, McError>;

    /// Version stamp of the engine's own inputs.
    fn version(&self) -> u64;
}

fn reject_rates_process(process: &ProcessEnum, engine: &str) -> Result<(), McError> {
    match process {
        ProcessEnum::Lmm(_) => Err(McError::Unsupported(format!(
            "{engine} engine cannot simulate a {}",
            process.name()
        ))),
        _ => Ok(()),
    }
}

fn control_process<'a>(process: &'a ProcessEnum, engine: &str) -> Result<&'a BlackScholesProcess, McError> {
    match process {
        ProcessEnum::BlackScholes(bs) => Ok(bs),
        other => Err(McError::Unsupported(format!(
            "{engine} control variate needs a BlackScholes process, got {}",
            other.name()
        ))),
    }
}

fn error_estimate(config: &MonteCarloConfig, error: f64) -> Option<f64> {
    match config.rng() {
        RngKind::PseudoRandom => Some(error),
        RngKind::LowDiscrepancy => None,
    }
}

fn simulate<P: StochasticProcess + ?Sized>(
    model: MonteCarloModel<'_, P>,
    config: &MonteCarloConfig,
) -> Result<PricingResult, McError> {
    let mut simulation = MonteCarloSimulation::new(model);
    let value = simulation.run(config)?;
    let stats = simulation.accumulator();
    Ok(PricingResult::new(
        value,
        error_estimate(config, stats.error_estimate()),
        stats.samples(),
    ))
}

fn regression_result(
    config: &MonteCarloConfig,
    valuation: LsmValuation,
    floor_at_zero: bool,
) -> PricingResult {
    let value = if floor_at_zero {
        valuation.value.max(0.0)
    } else {
        valuation.value
    };
    PricingResult::new(
        value,
        error_estimate(config, valuation.error_estimate),
        valuation.samples,
    )
    .with_additional(EXERCISE_PROBABILITY, valuation.exercise_probability)
    .with_additional(CALIBRATION_VALUE, valuation.report.in_sample_value)
}

fn log_result(engine: &str, result: &PricingResult) {
    debug!(
        engine,
        value = result.value,
        error_estimate = ?result.error_estimate,
        samples = result.samples,
        "Engine finished"
    );
}

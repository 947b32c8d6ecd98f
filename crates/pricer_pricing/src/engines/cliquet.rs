//! Cliquet and performance options.
//!
//! The reset dates and maturity split the life of the option into periods
//! `[b_i, b_{i+1}]`; each period pays its forward-starting payoff at its end,
//! discounted on the context curve.

use std::sync::Arc;

use tracing::debug;

use pricer_core::market_data::handle::Handle;
use pricer_models::instruments::CliquetOption;
use pricer_models::models::ProcessEnum;

use super::{log_result, reject_rates_process, simulate, PricingEngine};
use crate::context::PricingContext;
use crate::mc::{McError, MonteCarloConfig, MonteCarloModel, MultiPath, TimeGrid};
use crate::results::PricingResult;

/// Monte Carlo engine for cliquet and performance options.
pub struct MonteCarloCliquetEngine {
    process: Handle<ProcessEnum>,
    config: MonteCarloConfig,
}

impl MonteCarloCliquetEngine {
    /// Creates the engine.
    ///
    /// # Errors
    ///
    /// [`McError::Config`] for an invalid configuration.
    pub fn new(process: Handle<ProcessEnum>, config: MonteCarloConfig) -> Result<Self, McError> {
        config.validate()?;
        Ok(Self { process, config })
    }

    /// Relinks the simulated process, bumping the engine version.
    pub fn relink_process(&mut self, process: ProcessEnum) {
        self.process.relink(process);
    }
}

impl PricingEngine for MonteCarloCliquetEngine {
    type Instrument = CliquetOption;

    fn calculate(
        &self,
        option: &CliquetOption,
        context: &PricingContext,
    ) -> Result<PricingResult, McError> {
        if self.config.control_variate() {
            return Err(McError::Unsupported(
                "cliquet engine has no control variate".to_string(),
            ));
        }
        let process = self.process.current().as_ref();
        reject_rates_process(process, "cliquet")?;

        let mut boundaries: Vec<f64> = option
            .reset_dates()
            .iter()
            .map(|d| context.year_fraction(*d))
            .collect();
        if let Some(&first) = boundaries.first().filter(|t| **t < 0.0) {
            return Err(McError::InvalidInput(format!(
                "first reset lies {first} years before the valuation date"
            )));
        }
        boundaries.push(context.year_fraction(option.maturity()));

        let last = boundaries[boundaries.len() - 1];
        let grid = Arc::new(TimeGrid::new(&boundaries, self.config.steps_for(last))?);
        let indices = boundaries
            .iter()
            .map(|&t| grid.index(t))
            .collect::<Result<Vec<_>, _>>()?;
        let discounts = boundaries[1..]
            .iter()
            .map(|&t| context.discount(t))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(periods = discounts.len(), steps = grid.steps(), "Pricing cliquet");

        let strip = |path: &MultiPath| {
            indices
                .windows(2)
                .zip(&discounts)
                .map(|(w, df)| df * option.period_payoff(path.value(w[0], 0), path.value(w[1], 0)))
                .sum::<f64>()
        };

        let model = MonteCarloModel::new(process, grid, &strip, self.config.sequence_settings());
        let result = simulate(model, &self.config)?;
        log_result("cliquet", &result);
        Ok(result)
    }

    fn version(&self) -> u64 {
        self.process.version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::{Date, DayCountConvention};
    use pricer_models::analytical::black_formula;
    use pricer_models::instruments::{CliquetKind, OptionType};
    use pricer_models::models::BlackScholesProcess;

    fn today() -> Date {
        Date::from_ymd(2024, 1, 1).unwrap()
    }

    fn engine(samples: usize) -> MonteCarloCliquetEngine {
        let process: ProcessEnum = BlackScholesProcess::new(100.0, 0.04, 0.01, 0.2).unwrap().into();
        let config = MonteCarloConfig::builder()
            .required_samples(samples)
            .antithetic(true)
            .seed(5)
            .build()
            .unwrap();
        MonteCarloCliquetEngine::new(Handle::new(process), config).unwrap()
    }

    #[test]
    fn test_performance_strip_matches_forward_start_formula() {
        let ctx = PricingContext::flat(today(), DayCountConvention::Act365Fixed, 0.04);
        let resets: Vec<Date> = (0..4).map(|q| today().add_days(q * 365)).collect();
        let maturity = today().add_days(4 * 365);
        let option =
            CliquetOption::new(CliquetKind::Performance, OptionType::Call, 1.0, resets, maturity)
                .unwrap();
        let result = engine(20_000).calculate(&option, &ctx).unwrap();

        // Each yearly period is an ATM-forward-start call on a unit spot
        let period = black_formula(OptionType::Call, 1.0, 0.03_f64.exp(), 0.2, 1.0);
        let expected: f64 = (1..=4).map(|k| (-0.04 * k as f64).exp() * period).sum();
        let error = result.error_estimate.unwrap();
        assert!(
            (result.value - expected).abs() < 4.0 * error,
            "value {} expected {expected} error {error}",
            result.value
        );
    }

    #[test]
    fn test_past_reset_rejected() {
        let ctx = PricingContext::flat(today(), DayCountConvention::Act365Fixed, 0.04);
        let option = CliquetOption::new(
            CliquetKind::Cliquet,
            OptionType::Put,
            1.0,
            vec![today().add_days(-10), today().add_days(100)],
            today().add_days(200),
        )
        .unwrap();
        assert!(matches!(
            engine(100).calculate(&option, &ctx),
            Err(McError::InvalidInput(_))
        ));
    }
}

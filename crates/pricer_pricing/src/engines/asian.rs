//! Discrete arithmetic-average Asian options.
//!
//! Fixings before the valuation date are dropped; the average runs over the
//! remaining ones, a fixing on the valuation date reading the spot. With a
//! control variate the geometric average of the same fixings is priced in
//! closed form and its simulated counterpart subtracted path by path.

use std::sync::Arc;

use tracing::debug;

use pricer_core::market_data::handle::Handle;
use pricer_models::analytical::{discrete_geometric_asian, GeometricAsianInputs};
use pricer_models::instruments::AsianOption;
use pricer_models::models::ProcessEnum;

use super::{control_process, log_result, reject_rates_process, simulate, PricingEngine};
use crate::context::PricingContext;
use crate::mc::{ControlVariate, McError, MonteCarloConfig, MonteCarloModel, MultiPath, TimeGrid};
use crate::results::PricingResult;

/// Monte Carlo engine for discrete arithmetic-average Asian options.
///
/// # Examples
///
/// ```rust
/// use pricer_core::market_data::handle::Handle;
/// use pricer_core::types::{Date, DayCountConvention};
/// use pricer_models::instruments::{AsianOption, OptionType, PlainVanillaPayoff};
/// use pricer_models::models::{BlackScholesProcess, ProcessEnum};
/// use pricer_pricing::context::PricingContext;
/// use pricer_pricing::engines::{MonteCarloAsianEngine, PricingEngine};
/// use pricer_pricing::mc::MonteCarloConfig;
///
/// let today = Date::from_ymd(2024, 1, 1).unwrap();
/// let ctx = PricingContext::flat(today, DayCountConvention::Act365Fixed, 0.05);
/// let fixings: Vec<Date> = (1..=4).map(|q| today.add_days(q * 365 / 4)).collect();
/// let payment = *fixings.last().unwrap();
/// let option = AsianOption::new(
///     PlainVanillaPayoff::new(OptionType::Call, 100.0).unwrap(),
///     fixings,
///     payment,
/// )
/// .unwrap();
///
/// let process: ProcessEnum = BlackScholesProcess::new(100.0, 0.05, 0.0, 0.2).unwrap().into();
/// let config = MonteCarloConfig::builder()
///     .required_samples(4096)
///     .control_variate(true)
///     .seed(3)
///     .build()
///     .unwrap();
/// let engine = MonteCarloAsianEngine::new(Handle::new(process), config).unwrap();
/// let result = engine.calculate(&option, &ctx).unwrap();
/// assert!(result.value > 0.0 && result.error_estimate.unwrap() < 0.05);
/// ```
pub struct MonteCarloAsianEngine {
    process: Handle<ProcessEnum>,
    config: MonteCarloConfig,
}

impl MonteCarloAsianEngine {
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

    /// Simulation settings.
    #[inline]
    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }
}

impl PricingEngine for MonteCarloAsianEngine {
    type Instrument = AsianOption;

    fn calculate(
        &self,
        option: &AsianOption,
        context: &PricingContext,
    ) -> Result<PricingResult, McError> {
        let process = self.process.current().as_ref();
        reject_rates_process(process, "asian")?;

        let fixing_times: Vec<f64> = option
            .fixing_dates()
            .iter()
            .map(|d| context.year_fraction(*d))
            .filter(|t| *t >= 0.0)
            .collect();
        let last = match fixing_times.last() {
            Some(&t) if t > 0.0 => t,
            _ => {
                return Err(McError::InvalidInput(
                    "asian option has no fixing after the valuation date".to_string(),
                ))
            }
        };
        let payment = context.year_fraction(option.payment_date());
        let discount = context.discount(payment)?;

        let grid = Arc::new(TimeGrid::new(&fixing_times, self.config.steps_for(last))?);
        let indices = fixing_times
            .iter()
            .map(|&t| grid.index(t))
            .collect::<Result<Vec<_>, _>>()?;
        let n = indices.len() as f64;
        let payoff = *option.payoff();
        debug!(
            fixings = indices.len(),
            dropped = option.fixing_dates().len() - indices.len(),
            steps = grid.steps(),
            "Pricing asian option"
        );

        let arithmetic = |path: &MultiPath| {
            let average = indices.iter().map(|&i| path.value(i, 0)).sum::<f64>() / n;
            discount * payoff.value(average)
        };

        let control = if self.config.control_variate() {
            let bs = control_process(process, "asian")?;
            let value = discrete_geometric_asian(&GeometricAsianInputs {
                option_type: payoff.option_type(),
                strike: payoff.strike(),
                spot: bs.spot(),
                rate: bs.rate(),
                dividend: bs.dividend(),
                volatility: bs.volatility(),
                fixing_times: &fixing_times,
                maturity: payment,
            });
            Some((value, (-bs.rate() * payment).exp()))
        } else {
            None
        };
        let geometric = |path: &MultiPath| {
            let cv_discount = control.map_or(0.0, |(_, d)| d);
            let log_average = indices.iter().map(|&i| path.value(i, 0).ln()).sum::<f64>() / n;
            cv_discount * payoff.value(log_average.exp())
        };

        let mut model = MonteCarloModel::new(
            process,
            Arc::clone(&grid),
            &arithmetic,
            self.config.sequence_settings(),
        );
        if let Some((value, _)) = control {
            model = model.with_control_variate(ControlVariate {
                pricer: &geometric,
                value,
            });
        }

        let result = simulate(model, &self.config)?;
        log_result("asian", &result);
        Ok(result)
    }

    fn version(&self) -> u64 {
        self.process.version()
    }
}

//! American and Bermudan vanilla options by least-squares Monte Carlo.
//!
//! American exercise is approximated on a regular grid up to the last
//! exercise date, exercisable at every grid point after the valuation date
//! and not before the earliest exercise date. Bermudan exercise dates are
//! mandatory grid times. The regression state is moneyness `S / K`.
//!
//! With a control variate the European option is priced in closed form and
//! the regression value is floored at zero.

use std::sync::Arc;

use tracing::debug;

use pricer_core::market_data::handle::Handle;
use pricer_models::analytical::black_formula;
use pricer_models::instruments::{Exercise, PlainVanillaPayoff, VanillaOption};
use pricer_models::models::ProcessEnum;

use super::{control_process, log_result, regression_result, reject_rates_process, PricingEngine};
use crate::context::PricingContext;
use crate::lsm::{
    price_with_regression, BasisSystem, EarlyExercisePathPricer, ExerciseDiscounts,
};
use crate::mc::{ControlVariate, LsmConfig, McError, MonteCarloConfig, MultiPath, TimeGrid};
use crate::results::PricingResult;

/// Exercise schedule of a vanilla option on grid indices.
struct VanillaExercise {
    payoff: PlainVanillaPayoff,
    grid_indices: Vec<usize>,
    basis: BasisSystem,
}

impl EarlyExercisePathPricer for VanillaExercise {
    fn number_of_exercises(&self) -> usize {
        self.grid_indices.len()
    }

    fn state(&self, path: &MultiPath, exercise: usize, out: &mut [f64]) {
        out[0] = path.value(self.grid_indices[exercise], 0) / self.payoff.strike();
    }

    fn exercise_value(&self, path: &MultiPath, exercise: usize) -> f64 {
        self.payoff.value(path.value(self.grid_indices[exercise], 0))
    }

    fn basis_system(&self) -> &BasisSystem {
        &self.basis
    }
}

/// Longstaff-Schwartz engine for American and Bermudan vanilla options.
///
/// # Examples
///
/// ```rust
/// use pricer_core::market_data::handle::Handle;
/// use pricer_core::types::{Date, DayCountConvention};
/// use pricer_models::instruments::{Exercise, OptionType, PlainVanillaPayoff, VanillaOption};
/// use pricer_models::models::{BlackScholesProcess, ProcessEnum};
/// use pricer_pricing::context::PricingContext;
/// use pricer_pricing::engines::{MonteCarloAmericanEngine, PricingEngine, EXERCISE_PROBABILITY};
/// use pricer_pricing::mc::{LsmConfig, MonteCarloConfig};
///
/// let today = Date::from_ymd(2024, 1, 1).unwrap();
/// let ctx = PricingContext::flat(today, DayCountConvention::Act365Fixed, 0.06);
/// let option = VanillaOption::new(
///     PlainVanillaPayoff::new(OptionType::Put, 40.0).unwrap(),
///     Exercise::american(today, today.add_days(365)).unwrap(),
/// );
/// let process: ProcessEnum = BlackScholesProcess::new(40.0, 0.06, 0.0, 0.2).unwrap().into();
/// let config = MonteCarloConfig::builder()
///     .time_steps(20)
///     .antithetic(true)
///     .required_samples(4096)
///     .seed(42)
///     .build()
///     .unwrap();
/// let engine = MonteCarloAmericanEngine::new(Handle::new(process), config, LsmConfig::default()).unwrap();
///
/// let result = engine.calculate(&option, &ctx).unwrap();
/// assert!((result.value - 2.31).abs() < 0.1);
/// assert!(result.additional(EXERCISE_PROBABILITY).unwrap() > 0.0);
/// ```
pub struct MonteCarloAmericanEngine {
    process: Handle<ProcessEnum>,
    config: MonteCarloConfig,
    lsm: LsmConfig,
}

impl MonteCarloAmericanEngine {
    /// Creates the engine.
    ///
    /// # Errors
    ///
    /// [`McError::Config`] for an invalid configuration.
    pub fn new(
        process: Handle<ProcessEnum>,
        config: MonteCarloConfig,
        lsm: LsmConfig,
    ) -> Result<Self, McError> {
        config.validate()?;
        lsm.validate()?;
        Ok(Self {
            process,
            config,
            lsm,
        })
    }

    /// Relinks the simulated process, bumping the engine version.
    pub fn relink_process(&mut self, process: ProcessEnum) {
        self.process.relink(process);
    }

    fn schedule(
        &self,
        exercise: &Exercise,
        context: &PricingContext,
    ) -> Result<(TimeGrid, Vec<usize>), McError> {
        match exercise {
            Exercise::European { .. } => Err(McError::Unsupported(
                "european exercise has no early-exercise premium".to_string(),
            )),
            Exercise::American { earliest, latest } => {
                let end = context.year_fraction(*latest);
                if end <= 0.0 {
                    return Err(McError::InvalidInput(
                        "american exercise window has closed".to_string(),
                    ));
                }
                let steps = self.config.steps_for(end);
                if steps == 0 {
                    return Err(McError::InvalidInput(
                        "american exercise needs time steps".to_string(),
                    ));
                }
                let grid = TimeGrid::regular(end, steps)?;
                let first = context.year_fraction(*earliest);
                let indices = (1..grid.len())
                    .filter(|&i| grid.time(i) >= first - 1e-12)
                    .collect();
                Ok((grid, indices))
            }
            Exercise::Bermudan { dates } => {
                let times: Vec<f64> = dates
                    .iter()
                    .map(|d| context.year_fraction(*d))
                    .filter(|t| *t > 0.0)
                    .collect();
                let Some(&end) = times.last() else {
                    return Err(McError::InvalidInput(
                        "all bermudan exercise dates have passed".to_string(),
                    ));
                };
                let grid = TimeGrid::new(&times, self.config.steps_for(end))?;
                let indices = times
                    .iter()
                    .map(|&t| grid.index(t))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((grid, indices))
            }
        }
    }
}

impl PricingEngine for MonteCarloAmericanEngine {
    type Instrument = VanillaOption;

    fn calculate(
        &self,
        option: &VanillaOption,
        context: &PricingContext,
    ) -> Result<PricingResult, McError> {
        let process = self.process.current().as_ref();
        reject_rates_process(process, "american")?;

        let (grid, grid_indices) = self.schedule(option.exercise(), context)?;
        if grid_indices.is_empty() {
            return Err(McError::InvalidInput(
                "no exercise opportunity on the simulation grid".to_string(),
            ));
        }
        let exercise_times: Vec<f64> = grid_indices.iter().map(|&i| grid.time(i)).collect();
        let discounts =
            ExerciseDiscounts::from_curve(context.discount_curve().current().as_ref(), &exercise_times)?;
        let payoff = *option.payoff();
        let last_index = grid.len() - 1;
        let maturity = grid.last();
        debug!(
            exercises = grid_indices.len(),
            steps = grid.steps(),
            maturity,
            "Pricing early-exercise option"
        );

        let product = VanillaExercise {
            payoff,
            grid_indices,
            basis: BasisSystem::univariate(self.lsm.basis(), self.lsm.polynomial_order()),
        };

        let control = if self.config.control_variate() {
            let bs = control_process(process, "american")?;
            let discount = (-bs.rate() * maturity).exp();
            let forward = bs.spot() * ((bs.rate() - bs.dividend()) * maturity).exp();
            let value = black_formula(
                payoff.option_type(),
                payoff.strike(),
                forward,
                bs.volatility() * maturity.sqrt(),
                discount,
            );
            Some((value, discount))
        } else {
            None
        };
        let european = |path: &MultiPath| {
            control.map_or(0.0, |(_, discount)| discount * payoff.value(path.value(last_index, 0)))
        };
        let control_variate = control.map(|(value, _)| ControlVariate {
            pricer: &european,
            value,
        });

        let valuation = price_with_regression(
            process,
            Arc::new(grid),
            &product,
            discounts,
            &self.config,
            &self.lsm,
            control_variate,
        )?;
        let result = regression_result(&self.config, valuation, control.is_some());
        log_result("american", &result);
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
    use pricer_models::instruments::OptionType;
    use pricer_models::models::BlackScholesProcess;

    fn today() -> Date {
        Date::from_ymd(2024, 1, 1).unwrap()
    }

    fn put(exercise: Exercise) -> VanillaOption {
        VanillaOption::new(PlainVanillaPayoff::new(OptionType::Put, 40.0).unwrap(), exercise)
    }

    fn engine(control_variate: bool) -> MonteCarloAmericanEngine {
        let process: ProcessEnum = BlackScholesProcess::new(40.0, 0.06, 0.0, 0.2).unwrap().into();
        let config = MonteCarloConfig::builder()
            .time_steps(10)
            .antithetic(true)
            .control_variate(control_variate)
            .required_samples(2048)
            .seed(8)
            .build()
            .unwrap();
        MonteCarloAmericanEngine::new(Handle::new(process), config, LsmConfig::default()).unwrap()
    }

    #[test]
    fn test_european_exercise_rejected() {
        let ctx = PricingContext::flat(today(), DayCountConvention::Act365Fixed, 0.06);
        let option = put(Exercise::european(today().add_days(365)));
        assert!(matches!(
            engine(false).calculate(&option, &ctx),
            Err(McError::Unsupported(_))
        ));
    }

    #[test]
    fn test_bermudan_dates_become_exercises() {
        let ctx = PricingContext::flat(today(), DayCountConvention::Act365Fixed, 0.06);
        let dates = vec![
            today().add_days(-20),
            today().add_days(146),
            today().add_days(292),
            today().add_days(365),
        ];
        let option = put(Exercise::bermudan(dates).unwrap());
        let result = engine(false).calculate(&option, &ctx).unwrap();
        // Past date dropped; value between the European and American puts
        assert!(result.value > 2.0 && result.value < 2.45, "value {}", result.value);
    }

    #[test]
    fn test_control_variate_is_floored_and_consistent() {
        let ctx = PricingContext::flat(today(), DayCountConvention::Act365Fixed, 0.06);
        let option = put(Exercise::american(today(), today().add_days(365)).unwrap());
        let plain = engine(false).calculate(&option, &ctx).unwrap();
        let controlled = engine(true).calculate(&option, &ctx).unwrap();
        assert!(controlled.value >= 0.0);
        let spread = 4.0 * (plain.error_estimate.unwrap() + controlled.error_estimate.unwrap());
        assert!((plain.value - controlled.value).abs() < spread);
    }

    #[test]
    fn test_control_variate_removes_noise_at_maturity_only_exercise() {
        // A single exercise at expiry is the European control itself
        let ctx = PricingContext::flat(today(), DayCountConvention::Act365Fixed, 0.06);
        let option = put(Exercise::bermudan(vec![today().add_days(365)]).unwrap());
        let plain = engine(false).calculate(&option, &ctx).unwrap();
        let controlled = engine(true).calculate(&option, &ctx).unwrap();
        assert!(plain.error_estimate.unwrap() > 1e-3);
        assert!(controlled.error_estimate.unwrap() < 1e-10);
        assert!((plain.value - controlled.value).abs() < 4.0 * plain.error_estimate.unwrap());
    }

    #[test]
    fn test_rates_process_rejected() {
        use pricer_models::models::rates::lmm::{
            DriftAlgorithm, ExponentialCorrelation, LiborMarketModelProcess, LmmParameters,
            Measure,
        };
        let params = LmmParameters {
            rate_times: vec![0.5, 1.0, 1.5],
            initial_forwards: vec![0.03, 0.03],
            volatilities: vec![0.2, 0.2],
            displacements: vec![0.0, 0.0],
            correlation: ExponentialCorrelation {
                long_term: 0.5,
                beta: 0.1,
            },
            factors: 1,
            measure: Measure::Terminal,
        };
        let lmm = LiborMarketModelProcess::new(params, &[0.0, 0.5, 1.0], DriftAlgorithm::Auto)
            .unwrap();
        let config = MonteCarloConfig::builder().time_steps(4).required_samples(16).build().unwrap();
        let engine =
            MonteCarloAmericanEngine::new(Handle::new(lmm.into()), config, LsmConfig::default())
                .unwrap();
        let ctx = PricingContext::flat(today(), DayCountConvention::Act365Fixed, 0.06);
        let option = put(Exercise::american(today(), today().add_days(365)).unwrap());
        assert!(matches!(
            engine.calculate(&option, &ctx),
            Err(McError::Unsupported(_))
        ));
    }
}

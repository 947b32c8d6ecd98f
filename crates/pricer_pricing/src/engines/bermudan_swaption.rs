//! Bermudan swaptions under the LIBOR market model.
//!
//! Exercise values are deflated by the model numeraire at their reset, so
//! no discounting happens between exercise dates:
//!
//! ```text
//! terminal: h_e = N A_e max(±(S_e - K), 0)                  (A_e in P(T_n) units)
//! spot:     h_e = N A_e max(±(S_e - K), 0) / d_e / Π_{k<e} (1 + τ_k f_k(T_k))
//! ```
//!
//! The value at the valuation date is the numeraire's initial value times
//! the regression estimate: `P(0, T_n)` under the terminal measure and
//! `P(0, T_0)` under the spot measure. The regression state is the
//! coterminal swap rate `S_e`.

use std::sync::Arc;

use tracing::debug;

use pricer_core::market_data::handle::Handle;
use pricer_models::instruments::BermudanSwaption;
use pricer_models::models::rates::lmm::{LiborMarketModelProcess, LmmCurveState, Measure};
use pricer_models::models::ProcessEnum;

use super::{log_result, regression_result, PricingEngine};
use crate::context::PricingContext;
use crate::lsm::{
    price_with_regression, BasisSystem, EarlyExercisePathPricer, ExerciseDiscounts,
};
use crate::mc::{LsmConfig, McError, MonteCarloConfig, MultiPath, TimeGrid};
use crate::results::PricingResult;

struct SwaptionExercise<'a> {
    swaption: &'a BermudanSwaption,
    measure: Measure,
    curve: LmmCurveState,
    grid_indices: Vec<usize>,
    basis: BasisSystem,
}

impl SwaptionExercise<'_> {
    fn curve_at(&self, path: &MultiPath, exercise: usize) -> (LmmCurveState, usize) {
        let rate = self.swaption.exercise_indices()[exercise];
        let mut curve = self.curve.clone();
        curve.set_on_forward_rates(path.state(self.grid_indices[exercise]), rate);
        (curve, rate)
    }
}

impl EarlyExercisePathPricer for SwaptionExercise<'_> {
    fn number_of_exercises(&self) -> usize {
        self.grid_indices.len()
    }

    fn state(&self, path: &MultiPath, exercise: usize, out: &mut [f64]) {
        let (curve, rate) = self.curve_at(path, exercise);
        out[0] = curve.coterminal_swap_rate(rate);
    }

    fn exercise_value(&self, path: &MultiPath, exercise: usize) -> f64 {
        let (curve, rate) = self.curve_at(path, exercise);
        let value = self
            .swaption
            .exercise_value(curve.coterminal_swap_rate(rate), curve.coterminal_annuity(rate));
        match self.measure {
            Measure::Terminal => value,
            Measure::Spot => {
                let forwards = path.state(self.grid_indices[exercise]);
                let rolled: f64 = curve.rate_taus()[..rate]
                    .iter()
                    .zip(&forwards[..rate])
                    .map(|(tau, f)| 1.0 + tau * f)
                    .product();
                value / curve.discount_ratios()[rate] / rolled
            }
        }
    }

    fn basis_system(&self) -> &BasisSystem {
        &self.basis
    }
}

/// Longstaff-Schwartz engine for Bermudan swaptions on the rate grid of a
/// LIBOR market model.
///
/// The process is rebuilt on the simulation grid when it was built on
/// another one.
pub struct LmmBermudanSwaptionEngine {
    process: Handle<ProcessEnum>,
    config: MonteCarloConfig,
    lsm: LsmConfig,
}

impl LmmBermudanSwaptionEngine {
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
}

impl PricingEngine for LmmBermudanSwaptionEngine {
    type Instrument = BermudanSwaption;

    fn calculate(
        &self,
        swaption: &BermudanSwaption,
        context: &PricingContext,
    ) -> Result<PricingResult, McError> {
        let ProcessEnum::Lmm(model) = self.process.current().as_ref() else {
            return Err(McError::Unsupported(format!(
                "swaption engine needs a LiborMarketModel, got {}",
                self.process.current().name()
            )));
        };
        if self.config.control_variate() {
            return Err(McError::Unsupported(
                "swaption engine has no control variate".to_string(),
            ));
        }
        let params = model.parameters();
        let n = params.number_of_rates();
        let rate_times = &params.rate_times;

        let mut exercise_times = Vec::with_capacity(swaption.exercise_indices().len());
        for &e in swaption.exercise_indices() {
            if e >= n {
                return Err(McError::InvalidInput(format!(
                    "exercise index {e} beyond the {n} model rates"
                )));
            }
            if rate_times[e] <= 0.0 {
                return Err(McError::InvalidInput(format!(
                    "exercise at T_{e} = {} is not after the valuation date",
                    rate_times[e]
                )));
            }
            exercise_times.push(rate_times[e]);
        }

        let resets: Vec<f64> = rate_times[..n].iter().copied().filter(|&t| t > 0.0).collect();
        let last_reset = rate_times[n - 1];
        let grid = TimeGrid::new(&resets, self.config.steps_for(last_reset))?;
        let grid_indices = exercise_times
            .iter()
            .map(|&t| grid.index(t))
            .collect::<Result<Vec<_>, _>>()?;

        let rebuilt;
        let process: &LiborMarketModelProcess = if model.is_built_on(grid.times()) {
            &**model
        } else {
            debug!(steps = grid.steps(), "Rebuilding LIBOR market model on the simulation grid");
            rebuilt = model.on_grid(grid.times())?;
            &rebuilt
        };

        let mut initial = LmmCurveState::new(rate_times.clone())?;
        initial.set_on_forward_rates(&params.initial_forwards, 0);
        let first_discount = context.discount(rate_times[0])?;
        let numeraire_today = match params.measure {
            Measure::Terminal => first_discount / initial.discount_ratio(0, n),
            Measure::Spot => first_discount,
        };
        let discounts = ExerciseDiscounts::deflated(grid_indices.len(), numeraire_today)?;

        let product = SwaptionExercise {
            swaption,
            measure: params.measure,
            curve: LmmCurveState::new(rate_times.clone())?,
            grid_indices,
            basis: BasisSystem::univariate(self.lsm.basis(), self.lsm.polynomial_order()),
        };

        let valuation = price_with_regression(
            process,
            Arc::new(grid),
            &product,
            discounts,
            &self.config,
            &self.lsm,
            None,
        )?;
        let result = regression_result(&self.config, valuation, false);
        log_result("bermudan_swaption", &result);
        Ok(result)
    }

    fn version(&self) -> u64 {
        self.process.version()
    }
}

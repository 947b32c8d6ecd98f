//! Bermudan swaptions under the LIBOR market model.

use pricer_core::market_data::handle::Handle;
use pricer_models::instruments::BermudanSwaption;
use pricer_pricing::engines::{LmmBermudanSwaptionEngine, PricingEngine};
use tracing::info;

use super::Report;
use crate::config::Scenario;
use crate::Result;

/// Run the swaption command
pub fn run(scenario: &Scenario) -> Result<Report> {
    let ctx = scenario.context()?;
    let terms = &scenario.swaption;
    let exercises = terms.exercise_indices();

    let swaption = BermudanSwaption::new(
        terms.swap_type,
        terms.fixed_rate,
        terms.notional,
        exercises.clone(),
    )?;
    let engine = LmmBermudanSwaptionEngine::new(
        Handle::new(terms.process()?),
        scenario.simulation.to_config()?,
        scenario.lsm.to_config()?,
    )?;
    info!(
        rates = terms.lmm.number_of_rates(),
        exercises = exercises.len(),
        factors = terms.lmm.factors,
        measure = ?terms.lmm.measure,
        "Pricing Bermudan swaption"
    );
    let result = engine.calculate(&swaption, &ctx)?;

    Ok(Report {
        command: "swaption",
        instrument: format!(
            "{:?} {} x{}",
            terms.swap_type,
            terms.fixed_rate,
            exercises.len()
        )
        .to_lowercase(),
        process: format!("lmm {:?}", terms.lmm.measure).to_lowercase(),
        valuation_date: ctx.valuation_date(),
        result,
    })
}

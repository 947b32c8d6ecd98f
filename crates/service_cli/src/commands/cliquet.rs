//! Cliquet and performance options.

use pricer_core::market_data::handle::Handle;
use pricer_models::instruments::CliquetOption;
use pricer_pricing::engines::{MonteCarloCliquetEngine, PricingEngine};
use tracing::info;

use super::Report;
use crate::config::{schedule, Scenario};
use crate::Result;

/// Run the cliquet command
pub fn run(scenario: &Scenario) -> Result<Report> {
    let ctx = scenario.context()?;
    let terms = &scenario.cliquet;
    let today = ctx.valuation_date();

    let option = CliquetOption::new(
        terms.kind,
        terms.option_type,
        terms.moneyness,
        schedule(today, terms.maturity_days, terms.periods, true),
        today.add_days(terms.maturity_days),
    )?;

    let engine = MonteCarloCliquetEngine::new(
        Handle::new(scenario.process.build(scenario.rate)?),
        scenario.simulation.to_config()?,
    )?;
    info!(
        periods = terms.periods,
        moneyness = terms.moneyness,
        "Pricing {:?} option",
        terms.kind
    );
    let result = engine.calculate(&option, &ctx)?;

    Ok(Report {
        command: "cliquet",
        instrument: format!(
            "{:?} {:?} {} x{}",
            terms.kind, terms.option_type, terms.moneyness, terms.periods
        )
        .to_lowercase(),
        process: scenario.process.name().to_string(),
        valuation_date: today,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::Date;

    #[test]
    fn test_quarterly_performance_call() {
        let mut scenario = Scenario {
            valuation_date: Some(Date::from_ymd(2024, 1, 1).unwrap()),
            ..Default::default()
        };
        scenario.simulation.samples = Some(8192);
        let report = run(&scenario).unwrap();
        assert_eq!(report.instrument, "performance call 1 x4");
        // Four at-the-money quarterly returns, each worth about 0.046
        assert!(report.result.value > 0.12 && report.result.value < 0.25);
    }
}

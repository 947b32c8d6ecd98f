//! American and Bermudan vanilla options via least-squares Monte Carlo.

use pricer_core::market_data::handle::Handle;
use pricer_models::instruments::{Exercise, PlainVanillaPayoff, VanillaOption};
use pricer_pricing::engines::{MonteCarloAmericanEngine, PricingEngine};
use tracing::info;

use super::Report;
use crate::config::{schedule, Scenario};
use crate::Result;

/// Run the american command
pub fn run(scenario: &Scenario) -> Result<Report> {
    let ctx = scenario.context()?;
    let terms = &scenario.american;
    let today = ctx.valuation_date();

    let exercise = if terms.exercise_dates == 0 {
        Exercise::american(today, today.add_days(terms.maturity_days))?
    } else {
        Exercise::bermudan(schedule(
            today,
            terms.maturity_days,
            terms.exercise_dates,
            false,
        ))?
    };
    let style = if terms.exercise_dates == 0 { "american" } else { "bermudan" };
    let option = VanillaOption::new(
        PlainVanillaPayoff::new(terms.option_type, terms.strike)?,
        exercise,
    );

    let engine = MonteCarloAmericanEngine::new(
        Handle::new(scenario.process.build(scenario.rate)?),
        scenario.simulation.to_config()?,
        scenario.lsm.to_config()?,
    )?;
    info!(
        style,
        strike = terms.strike,
        calibration_samples = scenario.lsm.calibration_samples,
        "Pricing vanilla option with early exercise"
    );
    let result = engine.calculate(&option, &ctx)?;

    Ok(Report {
        command: "american",
        instrument: format!("{style} {:?} {}", terms.option_type, terms.strike).to_lowercase(),
        process: scenario.process.name().to_string(),
        valuation_date: today,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::Date;
    use pricer_pricing::engines::EXERCISE_PROBABILITY;

    fn scenario(exercise_dates: usize) -> Scenario {
        let mut scenario = Scenario {
            valuation_date: Some(Date::from_ymd(2024, 1, 1).unwrap()),
            ..Default::default()
        };
        scenario.simulation.time_steps = Some(12);
        scenario.simulation.samples = Some(4096);
        scenario.american.exercise_dates = exercise_dates;
        scenario
    }

    #[test]
    fn test_american_put_report() {
        let report = run(&scenario(0)).unwrap();
        assert_eq!(report.instrument, "american put 100");
        // At-the-money one-year put at 5%, 20% vol: European ~5.57, American ~6.09
        assert!(report.result.value > 5.0 && report.result.value < 7.0);
        assert_eq!(report.result.samples, 4096);
        assert!(report.result.additional(EXERCISE_PROBABILITY).is_some());
    }

    #[test]
    fn test_bermudan_style() {
        let report = run(&scenario(4)).unwrap();
        assert!(report.instrument.starts_with("bermudan"));
    }
}

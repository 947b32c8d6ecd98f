//! Check command implementation
//!
//! Validates every part of a scenario without running a simulation.

use pricer_models::instruments::{BermudanSwaption, PlainVanillaPayoff};
use serde::Serialize;

use crate::config::{OutputFormat, Scenario, ENV_VARS};
use crate::Result;

/// Outcome of one validation step.
#[derive(Debug, Clone, Serialize)]
pub struct CheckEntry {
    pub item: &'static str,
    pub ok: bool,
    pub detail: String,
}

fn entry<T>(item: &'static str, outcome: Result<T>, detail: impl FnOnce(T) -> String) -> CheckEntry {
    match outcome {
        Ok(value) => CheckEntry {
            item,
            ok: true,
            detail: detail(value),
        },
        Err(e) => CheckEntry {
            item,
            ok: false,
            detail: e.to_string(),
        },
    }
}

/// Validates `scenario`, one entry per part.
pub fn run(scenario: &Scenario) -> Vec<CheckEntry> {
    let mut entries = vec![
        entry("valuation date", scenario.valuation_date(), |d| d.to_string()),
        entry("simulation", scenario.simulation.to_config(), |c| {
            format!("{:?}, seed {}", c.rng(), c.seed())
        }),
        entry("lsm", scenario.lsm.to_config(), |c| {
            format!("{:?} order {}", c.basis(), c.polynomial_order())
        }),
        entry("process", scenario.process.build(scenario.rate), |p| {
            p.name().to_string()
        }),
        entry(
            "american",
            PlainVanillaPayoff::new(scenario.american.option_type, scenario.american.strike)
                .map_err(Into::into),
            |_| "ok".to_string(),
        ),
        entry(
            "swaption",
            scenario.swaption.process().and_then(|_| {
                BermudanSwaption::new(
                    scenario.swaption.swap_type,
                    scenario.swaption.fixed_rate,
                    scenario.swaption.notional,
                    scenario.swaption.exercise_indices(),
                )
                .map_err(Into::into)
            }),
            |_| format!("{} rates", scenario.swaption.lmm.number_of_rates()),
        ),
    ];
    let overrides: Vec<&str> = ENV_VARS
        .iter()
        .copied()
        .filter(|name| std::env::var(name).is_ok())
        .collect();
    entries.push(CheckEntry {
        item: "environment",
        ok: true,
        detail: if overrides.is_empty() {
            "no overrides".to_string()
        } else {
            overrides.join(", ")
        },
    });
    entries
}

/// Writes the check results to stdout.
pub fn emit(entries: &[CheckEntry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Table => {
            for e in entries {
                let mark = if e.ok { "ok" } else { "FAIL" };
                println!("{:<16} {:<5} {}", e.item, mark, e.detail);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricer_core::types::Date;

    #[test]
    fn test_default_scenario_needs_only_a_date() {
        let mut scenario = Scenario::default();
        let entries = run(&scenario);
        let failed: Vec<&str> = entries.iter().filter(|e| !e.ok).map(|e| e.item).collect();
        assert_eq!(failed, vec!["valuation date"]);

        scenario.valuation_date = Some(Date::from_ymd(2024, 1, 1).unwrap());
        assert!(run(&scenario).iter().all(|e| e.ok));
    }

    #[test]
    fn test_bad_sections_reported() {
        let mut scenario = Scenario::default();
        scenario.simulation.samples = None;
        scenario.american.strike = -1.0;
        let entries = run(&scenario);
        let failed: Vec<&str> = entries.iter().filter(|e| !e.ok).map(|e| e.item).collect();
        assert!(failed.contains(&"simulation"));
        assert!(failed.contains(&"american"));
        assert!(!failed.contains(&"lsm"));
    }
}

//! CLI command implementations
//!
//! Each pricing submodule builds its instrument and engine from a
//! [`Scenario`](crate::config::Scenario) and returns a [`Report`];
//! [`emit`] writes it in the requested format.

pub mod american;
pub mod asian;
pub mod check;
pub mod cliquet;
pub mod swaption;

use pricer_core::types::Date;
use pricer_pricing::PricingResult;
use serde::Serialize;

use crate::config::OutputFormat;
use crate::Result;

/// Outcome of one pricing command.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub command: &'static str,
    pub instrument: String,
    pub process: String,
    pub valuation_date: Date,
    pub result: PricingResult,
}

/// Writes `report` to stdout.
pub fn emit(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Table => print!("{}", render_table(report)),
    }
    Ok(())
}

const LABEL_WIDTH: usize = 22;
const VALUE_WIDTH: usize = 28;

fn rule(left: char, middle: char, right: char) -> String {
    format!(
        "{left}{}{middle}{}{right}\n",
        "─".repeat(LABEL_WIDTH + 2),
        "─".repeat(VALUE_WIDTH + 2)
    )
}

fn row(label: &str, value: &str) -> String {
    format!("│ {label:<LABEL_WIDTH$} │ {value:>VALUE_WIDTH$} │\n")
}

/// Renders `report` as a two-column table.
pub fn render_table(report: &Report) -> String {
    let result = &report.result;
    let mut out = String::new();
    out.push_str(&rule('┌', '┬', '┐'));
    out.push_str(&row(report.command, &report.instrument));
    out.push_str(&rule('├', '┼', '┤'));
    out.push_str(&row("process", &report.process));
    out.push_str(&row("valuation date", &report.valuation_date.to_string()));
    out.push_str(&row("value", &format!("{:.6}", result.value)));
    let error = result
        .error_estimate
        .map_or_else(|| "n/a".to_string(), |e| format!("{e:.6}"));
    out.push_str(&row("error estimate", &error));
    out.push_str(&row("samples", &result.samples.to_string()));
    for (name, value) in &result.additional_results {
        out.push_str(&row(name, &format!("{value:.6}")));
    }
    out.push_str(&rule('└', '┴', '┘'));
    out
}

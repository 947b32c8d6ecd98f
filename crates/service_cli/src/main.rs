//! mcprice - Monte Carlo pricing from the command line
//!
//! Runs the pricing engines on a TOML scenario file.
//!
//! # Commands
//!
//! - `mcprice american` - American or Bermudan vanilla option (least squares)
//! - `mcprice asian` - discrete arithmetic-average Asian option
//! - `mcprice cliquet` - cliquet or performance option
//! - `mcprice swaption` - Bermudan swaption under the LIBOR market model
//! - `mcprice check` - validate a scenario without simulating
//!
//! # Architecture
//!
//! As the service layer, this crate only wires configuration, logging and
//! output around the engines of `pricer_pricing`.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pricer_core::types::Date;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use config::{build_scenario, CliOverrides, OutputFormat};

/// Monte Carlo pricing engines
#[derive(Parser)]
#[command(name = "mcprice")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Scenario file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Valuation date (YYYY-MM-DD)
    #[arg(short, long, global = true)]
    date: Option<Date>,

    /// Flat continuously compounded risk-free rate
    #[arg(long, global = true)]
    rate: Option<f64>,

    /// Number of Monte Carlo samples
    #[arg(short = 'n', long, global = true)]
    samples: Option<usize>,

    /// Target standard error
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// Sample cap for tolerance runs
    #[arg(long, global = true)]
    max_samples: Option<usize>,

    /// Random seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Sequence generator (pseudo_random, halton)
    #[arg(long, global = true)]
    rng: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price an American or Bermudan vanilla option
    American,

    /// Price a discrete arithmetic-average Asian option
    Asian,

    /// Price a cliquet or performance option
    Cliquet,

    /// Price a Bermudan swaption under the LIBOR market model
    Swaption,

    /// Validate the scenario without simulating
    Check,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            valuation_date: self.date,
            rate: self.rate,
            samples: self.samples,
            tolerance: self.tolerance,
            max_samples: self.max_samples,
            seed: self.seed,
            rng: self.rng.clone(),
            format: self.format,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let scenario = build_scenario(
        cli.config.as_deref(),
        |key| std::env::var(key).ok(),
        &cli.overrides(),
    )
    .context("Failed to load scenario")?;
    debug!(?scenario, "Scenario resolved");

    let report = match cli.command {
        Commands::American => commands::american::run(&scenario)?,
        Commands::Asian => commands::asian::run(&scenario)?,
        Commands::Cliquet => commands::cliquet::run(&scenario)?,
        Commands::Swaption => commands::swaption::run(&scenario)?,
        Commands::Check => {
            let entries = commands::check::run(&scenario);
            commands::check::emit(&entries, scenario.format)?;
            if entries.iter().any(|e| !e.ok) {
                anyhow::bail!("Scenario check failed");
            }
            return Ok(());
        }
    };
    info!(
        command = report.command,
        value = report.result.value,
        samples = report.result.samples,
        "Pricing complete"
    );
    commands::emit(&report, scenario.format)?;
    Ok(())
}

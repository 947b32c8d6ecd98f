//! Scenario configuration
//!
//! A scenario is a TOML file holding the market, the simulation settings and
//! the terms of the instrument each command prices. Every table is optional
//! except for the valuation date, which may also come from the environment or
//! the command line.
//!
//! ```toml
//! valuation_date = "2024-01-01"
//! rate = 0.05
//!
//! [simulation]
//! time_steps = 50
//! samples = 50000
//! seed = 7
//!
//! [process]
//! model = "heston"
//! spot = 100.0
//! v0 = 0.04
//! kappa = 2.0
//! theta = 0.04
//! xi = 0.3
//! rho = -0.7
//! ```
//!
//! Priority (highest to lowest):
//! 1. Command-line arguments
//! 2. `MCPRICE_*` environment variables
//! 3. Scenario file
//! 4. Default values

use std::path::Path;
use std::str::FromStr;

use pricer_core::types::{Date, DayCountConvention};
use pricer_models::instruments::{CliquetKind, OptionType, SwapType};
use pricer_models::models::rates::lmm::{
    DriftAlgorithm, ExponentialCorrelation, LiborMarketModelProcess, LmmParameters, Measure,
};
use pricer_models::models::{BlackScholesProcess, HestonProcess, ProcessEnum};
use pricer_pricing::context::PricingContext;
use pricer_pricing::lsm::{BasisKind, DegenerateFitPolicy};
use pricer_pricing::mc::{LsmConfig, MonteCarloConfig};
use pricer_pricing::rng::RngKind;
use serde::{Deserialize, Serialize};

use crate::{CliError, Result};

/// Environment variables read by [`Scenario::apply_env`].
pub const ENV_VARS: [&str; 8] = [
    "MCPRICE_VALUATION_DATE",
    "MCPRICE_RATE",
    "MCPRICE_SAMPLES",
    "MCPRICE_TOLERANCE",
    "MCPRICE_MAX_SAMPLES",
    "MCPRICE_SEED",
    "MCPRICE_RNG",
    "MCPRICE_FORMAT",
];

/// Output format of a pricing report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Boxed table on stdout
    #[default]
    Table,
    /// Pretty-printed JSON on stdout
    Json,
}

impl FromStr for OutputFormat {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(CliError::InvalidOverride {
                name: "format".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

fn parse_rng(name: &str, value: &str) -> Result<RngKind> {
    match value.trim().to_lowercase().as_str() {
        "pseudo_random" | "pseudo-random" | "mt" => Ok(RngKind::PseudoRandom),
        "low_discrepancy" | "low-discrepancy" | "halton" => Ok(RngKind::LowDiscrepancy),
        _ => Err(CliError::InvalidOverride {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| CliError::InvalidOverride {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// `[simulation]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    pub time_steps: Option<usize>,
    pub time_steps_per_year: Option<usize>,
    pub brownian_bridge: bool,
    pub antithetic: bool,
    pub control_variate: bool,
    pub samples: Option<usize>,
    pub tolerance: Option<f64>,
    pub max_samples: Option<usize>,
    pub seed: u64,
    pub rng: RngKind,
    pub batch_size: Option<usize>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            time_steps: None,
            time_steps_per_year: None,
            brownian_bridge: false,
            antithetic: true,
            control_variate: false,
            samples: Some(50_000),
            tolerance: None,
            max_samples: None,
            seed: 42,
            rng: RngKind::PseudoRandom,
            batch_size: None,
        }
    }
}

impl SimulationSection {
    /// Builds and validates the engine settings.
    pub fn to_config(&self) -> Result<MonteCarloConfig> {
        let mut builder = MonteCarloConfig::builder()
            .brownian_bridge(self.brownian_bridge)
            .antithetic(self.antithetic)
            .control_variate(self.control_variate)
            .seed(self.seed)
            .rng(self.rng);
        if let Some(steps) = self.time_steps {
            builder = builder.time_steps(steps);
        }
        if let Some(steps) = self.time_steps_per_year {
            builder = builder.time_steps_per_year(steps);
        }
        if let Some(samples) = self.samples {
            builder = builder.required_samples(samples);
        }
        if let Some(tolerance) = self.tolerance {
            builder = builder.required_tolerance(tolerance);
        }
        if let Some(max) = self.max_samples {
            builder = builder.max_samples(max);
        }
        if let Some(size) = self.batch_size {
            builder = builder.batch_size(size);
        }
        Ok(builder.build()?)
    }
}

/// `[lsm]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LsmSection {
    pub calibration_samples: usize,
    pub antithetic_calibration: Option<bool>,
    pub calibration_seed: Option<u64>,
    pub polynomial_order: usize,
    pub basis: BasisKind,
    pub degenerate_fit: DegenerateFitPolicy,
}

impl Default for LsmSection {
    fn default() -> Self {
        Self {
            calibration_samples: 2048,
            antithetic_calibration: None,
            calibration_seed: None,
            polynomial_order: 2,
            basis: BasisKind::Monomial,
            degenerate_fit: DegenerateFitPolicy::default(),
        }
    }
}

impl LsmSection {
    /// Builds and validates the calibration settings.
    pub fn to_config(&self) -> Result<LsmConfig> {
        let mut builder = LsmConfig::builder()
            .calibration_samples(self.calibration_samples)
            .polynomial_order(self.polynomial_order)
            .basis(self.basis)
            .degenerate_fit(self.degenerate_fit);
        if let Some(enabled) = self.antithetic_calibration {
            builder = builder.antithetic_calibration(enabled);
        }
        if let Some(seed) = self.calibration_seed {
            builder = builder.calibration_seed(seed);
        }
        Ok(builder.build()?)
    }
}

/// `[process]` table: the equity process, tagged by `model`.
///
/// The risk-free rate is the scenario's top-level `rate`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ProcessSpec {
    BlackScholes {
        spot: f64,
        volatility: f64,
        #[serde(default)]
        dividend: f64,
    },
    Heston {
        spot: f64,
        v0: f64,
        kappa: f64,
        theta: f64,
        xi: f64,
        rho: f64,
        #[serde(default)]
        dividend: f64,
    },
}

impl Default for ProcessSpec {
    fn default() -> Self {
        ProcessSpec::BlackScholes {
            spot: 100.0,
            volatility: 0.2,
            dividend: 0.0,
        }
    }
}

impl ProcessSpec {
    /// Builds the process with risk-free `rate`.
    pub fn build(&self, rate: f64) -> Result<ProcessEnum> {
        let process = match *self {
            ProcessSpec::BlackScholes {
                spot,
                volatility,
                dividend,
            } => BlackScholesProcess::new(spot, rate, dividend, volatility)?.into(),
            ProcessSpec::Heston {
                spot,
                v0,
                kappa,
                theta,
                xi,
                rho,
                dividend,
            } => HestonProcess::new(spot, v0, kappa, theta, xi, rho, rate, dividend)?.into(),
        };
        Ok(process)
    }

    /// Model name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            ProcessSpec::BlackScholes { .. } => "black_scholes",
            ProcessSpec::Heston { .. } => "heston",
        }
    }
}

/// `[american]` table: vanilla option with early exercise.
///
/// `exercise_dates = 0` means American exercise up to maturity; otherwise
/// the option is Bermudan on that many evenly spaced dates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmericanSection {
    pub option_type: OptionType,
    pub strike: f64,
    pub maturity_days: i64,
    pub exercise_dates: usize,
}

impl Default for AmericanSection {
    fn default() -> Self {
        Self {
            option_type: OptionType::Put,
            strike: 100.0,
            maturity_days: 365,
            exercise_dates: 0,
        }
    }
}

/// `[asian]` table: arithmetic average on evenly spaced fixings, paid at
/// the last one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AsianSection {
    pub option_type: OptionType,
    pub strike: f64,
    pub maturity_days: i64,
    pub fixings: usize,
}

impl Default for AsianSection {
    fn default() -> Self {
        Self {
            option_type: OptionType::Call,
            strike: 100.0,
            maturity_days: 365,
            fixings: 12,
        }
    }
}

/// `[cliquet]` table: resets every `maturity_days / periods` days starting
/// on the valuation date.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliquetSection {
    pub kind: CliquetKind,
    pub option_type: OptionType,
    pub moneyness: f64,
    pub maturity_days: i64,
    pub periods: usize,
}

impl Default for CliquetSection {
    fn default() -> Self {
        Self {
            kind: CliquetKind::Performance,
            option_type: OptionType::Call,
            moneyness: 1.0,
            maturity_days: 365,
            periods: 4,
        }
    }
}

/// `[swaption]` table with its `[swaption.lmm]` model.
///
/// An empty `exercises` list exercises into every coterminal swap.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwaptionSection {
    pub swap_type: SwapType,
    pub fixed_rate: f64,
    pub notional: f64,
    pub exercises: Vec<usize>,
    pub drift: DriftAlgorithm,
    pub lmm: LmmParameters,
}

impl Default for SwaptionSection {
    fn default() -> Self {
        let n = 10;
        Self {
            swap_type: SwapType::Payer,
            fixed_rate: 0.05,
            notional: 1.0,
            exercises: Vec::new(),
            drift: DriftAlgorithm::Auto,
            lmm: LmmParameters {
                rate_times: (0..=n).map(|i| 1.0 + 0.5 * i as f64).collect(),
                initial_forwards: vec![0.05; n],
                volatilities: vec![0.15; n],
                displacements: vec![0.0; n],
                correlation: ExponentialCorrelation {
                    long_term: 0.5,
                    beta: 0.2,
                },
                factors: 3,
                measure: Measure::Terminal,
            },
        }
    }
}

impl SwaptionSection {
    /// Exercise indices, defaulting to every reset.
    pub fn exercise_indices(&self) -> Vec<usize> {
        if self.exercises.is_empty() {
            (0..self.lmm.number_of_rates()).collect()
        } else {
            self.exercises.clone()
        }
    }

    /// Builds the LMM on its reset times; the engine moves it onto the
    /// simulation grid.
    pub fn process(&self) -> Result<ProcessEnum> {
        self.lmm.validate()?;
        let resets = &self.lmm.rate_times[..self.lmm.number_of_rates()];
        Ok(LiborMarketModelProcess::new(self.lmm.clone(), resets, self.drift)?.into())
    }
}

/// Command-line overrides; `None` leaves the scenario value alone.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub valuation_date: Option<Date>,
    pub rate: Option<f64>,
    pub samples: Option<usize>,
    pub tolerance: Option<f64>,
    pub max_samples: Option<usize>,
    pub seed: Option<u64>,
    pub rng: Option<String>,
    pub format: Option<OutputFormat>,
}

/// A complete pricing scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub valuation_date: Option<Date>,
    pub day_count: DayCountConvention,
    pub rate: f64,
    pub format: OutputFormat,
    pub simulation: SimulationSection,
    pub lsm: LsmSection,
    pub process: ProcessSpec,
    pub american: AmericanSection,
    pub asian: AsianSection,
    pub cliquet: CliquetSection,
    pub swaption: SwaptionSection,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            valuation_date: None,
            day_count: DayCountConvention::default(),
            rate: 0.05,
            format: OutputFormat::default(),
            simulation: SimulationSection::default(),
            lsm: LsmSection::default(),
            process: ProcessSpec::default(),
            american: AmericanSection::default(),
            asian: AsianSection::default(),
            cliquet: CliquetSection::default(),
            swaption: SwaptionSection::default(),
        }
    }
}

impl Scenario {
    /// Parses a scenario from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a scenario file.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Applies `MCPRICE_*` overrides found by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("MCPRICE_VALUATION_DATE") {
            self.valuation_date = Some(Date::parse(&value)?);
        }
        if let Some(value) = lookup("MCPRICE_RATE") {
            self.rate = parse_value("MCPRICE_RATE", &value)?;
        }
        if let Some(value) = lookup("MCPRICE_SAMPLES") {
            self.simulation.samples = Some(parse_value("MCPRICE_SAMPLES", &value)?);
        }
        if let Some(value) = lookup("MCPRICE_TOLERANCE") {
            self.simulation.tolerance = Some(parse_value("MCPRICE_TOLERANCE", &value)?);
        }
        if let Some(value) = lookup("MCPRICE_MAX_SAMPLES") {
            self.simulation.max_samples = Some(parse_value("MCPRICE_MAX_SAMPLES", &value)?);
        }
        if let Some(value) = lookup("MCPRICE_SEED") {
            self.simulation.seed = parse_value("MCPRICE_SEED", &value)?;
        }
        if let Some(value) = lookup("MCPRICE_RNG") {
            self.simulation.rng = parse_rng("MCPRICE_RNG", &value)?;
        }
        if let Some(value) = lookup("MCPRICE_FORMAT") {
            self.format = value.parse()?;
        }
        Ok(())
    }

    /// Applies command-line overrides.
    pub fn apply_cli(&mut self, cli: &CliOverrides) -> Result<()> {
        if let Some(date) = cli.valuation_date {
            self.valuation_date = Some(date);
        }
        if let Some(rate) = cli.rate {
            self.rate = rate;
        }
        if let Some(samples) = cli.samples {
            self.simulation.samples = Some(samples);
        }
        if let Some(tolerance) = cli.tolerance {
            self.simulation.tolerance = Some(tolerance);
        }
        if let Some(max) = cli.max_samples {
            self.simulation.max_samples = Some(max);
        }
        if let Some(seed) = cli.seed {
            self.simulation.seed = seed;
        }
        if let Some(rng) = &cli.rng {
            self.simulation.rng = parse_rng("--rng", rng)?;
        }
        if let Some(format) = cli.format {
            self.format = format;
        }
        Ok(())
    }

    /// Valuation date, which has no default.
    pub fn valuation_date(&self) -> Result<Date> {
        self.valuation_date.ok_or_else(|| {
            CliError::InvalidScenario(
                "valuation_date is required (scenario, MCPRICE_VALUATION_DATE or --date)"
                    .to_string(),
            )
        })
    }

    /// Pricing context on a flat curve at `rate`.
    pub fn context(&self) -> Result<PricingContext> {
        Ok(PricingContext::flat(
            self.valuation_date()?,
            self.day_count,
            self.rate,
        ))
    }
}

/// Builds the scenario from all sources.
pub fn build_scenario<F>(path: Option<&Path>, lookup: F, cli: &CliOverrides) -> Result<Scenario>
where
    F: Fn(&str) -> Option<String>,
{
    let mut scenario = match path {
        Some(path) => Scenario::from_file(path)?,
        None => Scenario::default(),
    };
    scenario.apply_env(lookup)?;
    scenario.apply_cli(cli)?;
    Ok(scenario)
}

/// `count` dates evenly spread over `span_days` after `start`; the first
/// date is `start` itself when `from_start` is set.
pub fn schedule(start: Date, span_days: i64, count: usize, from_start: bool) -> Vec<Date> {
    let n = count as i64;
    if from_start {
        (0..n).map(|k| start.add_days(k * span_days / n)).collect()
    } else {
        (1..=n).map(|k| start.add_days(k * span_days / n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    const SCENARIO: &str = r#"
        valuation_date = "2024-03-01"
        rate = 0.03
        day_count = "Act360"

        [simulation]
        time_steps = 24
        samples = 8192
        seed = 7

        [lsm]
        polynomial_order = 3
        basis = "laguerre"

        [process]
        model = "heston"
        spot = 100.0
        v0 = 0.04
        kappa = 2.0
        theta = 0.04
        xi = 0.3
        rho = -0.7

        [american]
        option_type = "call"
        exercise_dates = 4

        [swaption]
        swap_type = "receiver"
        exercises = [1, 2]
    "#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_parse_full_scenario() {
        let scenario = Scenario::from_toml(SCENARIO).unwrap();
        assert_eq!(scenario.valuation_date, Some(Date::from_ymd(2024, 3, 1).unwrap()));
        assert_eq!(scenario.day_count, DayCountConvention::Act360);
        assert_relative_eq!(scenario.rate, 0.03);
        assert_eq!(scenario.simulation.time_steps, Some(24));
        assert_eq!(scenario.simulation.samples, Some(8192));
        assert!(scenario.simulation.antithetic);
        assert_eq!(scenario.lsm.basis, BasisKind::Laguerre);
        assert_eq!(scenario.lsm.calibration_samples, 2048);
        assert_eq!(scenario.process.name(), "heston");
        assert_eq!(scenario.american.option_type, OptionType::Call);
        assert_relative_eq!(scenario.american.strike, 100.0);
        assert_eq!(scenario.swaption.swap_type, SwapType::Receiver);
        assert_eq!(scenario.swaption.exercise_indices(), vec![1, 2]);
        assert_eq!(scenario.swaption.lmm.number_of_rates(), 10);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = Scenario::from_toml("[simulation]\nsamplez = 10\n");
        assert!(matches!(result, Err(CliError::Parse(_))));
    }

    #[test]
    fn test_defaults_build_valid_configs() {
        let scenario = Scenario::default();
        let config = scenario.simulation.to_config().unwrap();
        assert_eq!(config.required_samples(), Some(50_000));
        assert!(config.antithetic());
        assert_eq!(scenario.lsm.to_config().unwrap().polynomial_order(), 2);
        assert!(scenario.process.build(scenario.rate).is_ok());
        assert!(scenario.swaption.process().is_ok());
        assert_eq!(scenario.swaption.exercise_indices().len(), 10);
    }

    #[test]
    fn test_missing_valuation_date() {
        let scenario = Scenario::default();
        assert!(matches!(
            scenario.valuation_date(),
            Err(CliError::InvalidScenario(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut scenario = Scenario::from_toml(SCENARIO).unwrap();
        scenario
            .apply_env(env(&[
                ("MCPRICE_SAMPLES", "1000"),
                ("MCPRICE_RNG", "halton"),
                ("MCPRICE_FORMAT", "JSON"),
                ("MCPRICE_VALUATION_DATE", "2024-06-03"),
            ]))
            .unwrap();
        assert_eq!(scenario.simulation.samples, Some(1000));
        assert_eq!(scenario.simulation.rng, RngKind::LowDiscrepancy);
        assert_eq!(scenario.format, OutputFormat::Json);
        assert_eq!(scenario.valuation_date, Some(Date::from_ymd(2024, 6, 3).unwrap()));
        assert_eq!(scenario.simulation.seed, 7);
    }

    #[test]
    fn test_cli_overrides_env() {
        let cli = CliOverrides {
            samples: Some(2048),
            seed: Some(99),
            ..Default::default()
        };
        let scenario = build_scenario(
            None,
            env(&[("MCPRICE_SAMPLES", "1000"), ("MCPRICE_RATE", "0.01")]),
            &cli,
        )
        .unwrap();
        assert_eq!(scenario.simulation.samples, Some(2048));
        assert_eq!(scenario.simulation.seed, 99);
        assert_relative_eq!(scenario.rate, 0.01);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut scenario = Scenario::default();
        let err = scenario
            .apply_env(env(&[("MCPRICE_SEED", "seven")]))
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidOverride { ref name, .. } if name == "MCPRICE_SEED"));
    }

    #[test]
    fn test_tolerance_with_halton_rejected() {
        let mut scenario = Scenario::default();
        scenario.simulation.rng = RngKind::LowDiscrepancy;
        scenario.simulation.tolerance = Some(0.01);
        assert!(matches!(
            scenario.simulation.to_config(),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_missing_scenario_file() {
        let result = build_scenario(
            Some(Path::new("/nonexistent/mcprice.toml")),
            |_| None,
            &CliOverrides::default(),
        );
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }

    #[test]
    fn test_schedule() {
        let start = Date::from_ymd(2024, 1, 1).unwrap();
        let fixings = schedule(start, 365, 4, false);
        assert_eq!(fixings.len(), 4);
        assert_eq!(fixings[0] - start, 91);
        assert_eq!(fixings[3] - start, 365);

        let resets = schedule(start, 365, 4, true);
        assert_eq!(resets[0], start);
        assert_eq!(resets[3] - start, 273);
    }
}

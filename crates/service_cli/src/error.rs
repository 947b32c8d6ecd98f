//! CLI error types.

use pricer_core::types::DateError;
use pricer_models::instruments::InstrumentError;
use pricer_models::models::ModelError;
use pricer_pricing::mc::{ConfigError, McError};
use thiserror::Error;

/// Errors surfaced by `mcprice` commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Scenario file does not exist
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),

    /// Scenario file could not be read
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// Scenario file is not valid TOML for a scenario
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment or command-line override could not be applied
    #[error("Invalid override {name}: {value}")]
    InvalidOverride {
        /// Variable or flag name
        name: String,
        /// Offending value
        value: String,
    },

    /// Scenario content is inconsistent
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    /// Bad date in the scenario
    #[error(transparent)]
    Date(#[from] DateError),

    /// Simulation settings rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Process parameters rejected
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Instrument terms rejected
    #[error(transparent)]
    Instrument(#[from] InstrumentError),

    /// Engine failure
    #[error(transparent)]
    Pricing(#[from] McError),

    /// JSON output failure
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;

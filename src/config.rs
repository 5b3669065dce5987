//! TOML-based scenario configuration.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::io::InputConfig;
use crate::sim::gain::DEFAULT_GAIN;
use crate::sim::types::SimParams;
use crate::sim::window::{TimeWindow, parse_clock};

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Initial inverter output and gain expression.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Optional wall-clock window; absent means every record is simulated.
    #[serde(default)]
    pub window: Option<WindowConfig>,
    /// Layout of the load CSV.
    #[serde(default)]
    pub input: InputSection,
}

/// Run parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Inverter output before the first step (kW, must be >= 0).
    pub initial_inverter_power_kw: f64,
    /// Gain expression in `ratio`/`lambda`/`λ`. Absent means the default gain.
    pub gain_expression: Option<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_inverter_power_kw: 10.0,
            gain_expression: Some(DEFAULT_GAIN.to_string()),
        }
    }
}

/// Inclusive `HH:MM:SS` window bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputSection {
    /// Whether the first CSV row is a header.
    pub has_headers: bool,
    /// Single ASCII field delimiter.
    pub delimiter: char,
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            has_headers: true,
            delimiter: ',',
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"window.start"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: 10 kW initial output, gain `0.01`,
    /// no window, comma-separated input with a header row.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let initial = self.simulation.initial_inverter_power_kw;
        if !initial.is_finite() || initial < 0.0 {
            errors.push(ConfigError::new(
                "simulation.initial_inverter_power_kw",
                format!("must be a finite number >= 0, got {initial}"),
            ));
        }

        if let Some(window) = &self.window {
            let start = parse_clock(&window.start);
            let end = parse_clock(&window.end);
            if start.is_err() {
                errors.push(ConfigError::new(
                    "window.start",
                    format!("expected HH:MM:SS, got \"{}\"", window.start),
                ));
            }
            if end.is_err() {
                errors.push(ConfigError::new(
                    "window.end",
                    format!("expected HH:MM:SS, got \"{}\"", window.end),
                ));
            }
            if let (Ok(start), Ok(end)) = (start, end) {
                if start > end {
                    errors.push(ConfigError::new("window.start", "must be <= window.end"));
                }
            }
        }

        let delimiter = self.input.delimiter;
        if !delimiter.is_ascii() || delimiter == '"' || delimiter == '\n' || delimiter == '\r' {
            errors.push(ConfigError::new(
                "input.delimiter",
                format!("must be a single ASCII separator, got {delimiter:?}"),
            ));
        }

        errors
    }

    /// Builds the engine parameters from this scenario.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the window bounds cannot be parsed.
    pub fn to_params(&self) -> Result<SimParams, ConfigError> {
        let mut params = SimParams::new(
            self.simulation.initial_inverter_power_kw,
            self.simulation.gain_expression.as_deref(),
        );
        if let Some(window) = &self.window {
            let window = TimeWindow::parse(&window.start, &window.end)
                .map_err(|e| ConfigError::new("window", e.to_string()))?;
            params = params.with_time_window(window);
        }
        Ok(params)
    }

    /// Returns the CSV layout for the load reader.
    pub fn input_config(&self) -> InputConfig {
        InputConfig {
            has_headers: self.input.has_headers,
            // Non-ASCII delimiters are rejected by `validate`.
            delimiter: u8::try_from(self.input.delimiter).unwrap_or(b','),
        }
    }
}

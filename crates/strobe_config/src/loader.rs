//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::StrobeConfig;
use std::path::Path;
use strobe_common::Frequency;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "strobe.toml";

/// Loads and validates a `strobe.toml` configuration from a project directory.
///
/// Reads `<project_dir>/strobe.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<StrobeConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `strobe.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<StrobeConfig, ConfigError> {
    let config: StrobeConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and values are in range.
///
/// Cross-field checks (bit time, debounce threshold, counter width) happen
/// when the configuration is resolved into simulator parameters.
fn validate_config(config: &StrobeConfig) -> Result<(), ConfigError> {
    let frequency = match &config.clock {
        Some(clock) if !clock.frequency.trim().is_empty() => &clock.frequency,
        _ => return Err(ConfigError::MissingField("clock.frequency".to_string())),
    };
    let hz: Frequency = frequency
        .parse()
        .map_err(|e| ConfigError::ValidationError(format!("clock.frequency: {e}")))?;
    if !hz.is_valid_clock() {
        return Err(ConfigError::ValidationError(format!(
            "clock.frequency must be positive, got '{frequency}'"
        )));
    }
    if config.uart.baud == 0 {
        return Err(ConfigError::ValidationError(
            "uart.baud must be positive".to_string(),
        ));
    }
    if config.debounce.time_ms == 0 {
        return Err(ConfigError::ValidationError(
            "debounce.time_ms must be positive".to_string(),
        ));
    }
    if config.harness.watchdog_cycles == 0 {
        return Err(ConfigError::ValidationError(
            "harness.watchdog_cycles must be positive".to_string(),
        ));
    }
    Ok(())
}

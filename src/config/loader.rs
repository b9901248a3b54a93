//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the default preset.
pub const DEFAULT_PRESET_ENV: &str = "TRUSTED_PROXY_DEFAULT_PRESET";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse, apply environment overrides, and validate a TOML document.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let mut config: ServiceConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config, std::env::var(DEFAULT_PRESET_ENV).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// A non-empty `default_preset` override replaces the configured one.
pub fn apply_env_overrides(config: &mut ServiceConfig, default_preset: Option<String>) {
    if let Some(preset) = default_preset.filter(|preset| !preset.is_empty()) {
        tracing::debug!(preset = %preset, "Default preset taken from environment");
        config.trusted_proxies.default_preset = Some(preset);
    }
}

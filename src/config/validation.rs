//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check proxy entries are IPs, CIDR blocks, or `*`
//! - Check configured header names are valid HTTP header names
//! - Check preset names are present and unique
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - An unknown default preset only warns; requests fall back to the base policy

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{HeadersConfig, ServiceConfig};
use crate::trust::proxies::ProxyMatcher;
use crate::trust::request::parse_header_name;

/// A semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid trusted proxy '{entry}' in {scope}")]
    InvalidProxy { scope: String, entry: String },

    #[error("invalid header name '{name}' in {scope}")]
    InvalidHeaderName { scope: String, name: String },

    #[error("preset at position {0} has an empty name")]
    EmptyPresetName(usize),

    #[error("duplicate preset '{0}'")]
    DuplicatePreset(String),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let trusted = &config.trusted_proxies;

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    check_proxies("trusted_proxies", &trusted.proxies, &mut errors);
    check_headers("trusted_proxies.headers", &trusted.headers, &mut errors);

    for name in &trusted.preset_secret_headers {
        if parse_header_name(name).is_none() {
            errors.push(ValidationError::InvalidHeaderName {
                scope: "trusted_proxies.preset_secret_headers".to_string(),
                name: name.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    for (index, preset) in trusted.presets.iter().enumerate() {
        if preset.name.is_empty() {
            errors.push(ValidationError::EmptyPresetName(index));
        } else if !seen.insert(preset.name.as_str()) {
            errors.push(ValidationError::DuplicatePreset(preset.name.clone()));
        }

        let scope = format!("preset '{}'", preset.name);
        check_proxies(&scope, &preset.proxies, &mut errors);
        check_headers(&scope, &preset.headers, &mut errors);

        if let Some(secret) = &preset.secret {
            if !secret_fits_header(secret) {
                tracing::warn!(
                    preset = %preset.name,
                    "Preset secret has characters a header value cannot carry as text; it will never match"
                );
            }
        }
    }

    if let Some(name) = &trusted.default_preset {
        if !name.is_empty() && trusted.preset(name).is_none() {
            tracing::warn!(preset = %name, "Default preset not found, base policy will apply");
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether a secret can arrive as a readable header value: visible ASCII,
/// space and tab only. Header values with other bytes read as absent.
pub fn secret_fits_header(secret: &str) -> bool {
    secret
        .bytes()
        .all(|b| b == b'\t' || (b' '..=b'~').contains(&b))
}

fn check_proxies(scope: &str, proxies: &[String], errors: &mut Vec<ValidationError>) {
    for entry in proxies {
        if ProxyMatcher::parse(entry).is_none() {
            errors.push(ValidationError::InvalidProxy {
                scope: scope.to_string(),
                entry: entry.clone(),
            });
        }
    }
}

fn check_headers(scope: &str, headers: &HeadersConfig, errors: &mut Vec<ValidationError>) {
    for (_, setting) in headers.iter() {
        if let Some(name) = setting.custom_name() {
            if parse_header_name(name).is_none() {
                errors.push(ValidationError::InvalidHeaderName {
                    scope: scope.to_string(),
                    name: name.to_string(),
                });
            }
        }
    }
}

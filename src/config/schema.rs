//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::trust::header::{HeaderKind, HeaderSet};

/// Root configuration for the proxy-trust service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Trusted proxy policy: base settings plus presets.
    pub trusted_proxies: TrustedProxiesConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// How a forwarded header kind is treated.
///
/// Written in config files as `true`, `false` or a header name. A name means
/// the value is read from that header and copied onto the canonical one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HeaderSetting {
    Toggle(bool),
    Name(String),
}

impl Default for HeaderSetting {
    fn default() -> Self {
        HeaderSetting::Toggle(false)
    }
}

impl HeaderSetting {
    /// Whether values of this header kind may be trusted.
    pub fn is_enabled(&self) -> bool {
        match self {
            HeaderSetting::Toggle(enabled) => *enabled,
            HeaderSetting::Name(name) => !name.is_empty(),
        }
    }

    /// The custom header name to copy from, if one is configured.
    ///
    /// The literal string `"true"` is the enabled sentinel, not a name.
    pub fn custom_name(&self) -> Option<&str> {
        match self {
            HeaderSetting::Name(name) if !name.is_empty() && name != "true" => Some(name),
            _ => None,
        }
    }
}

impl From<bool> for HeaderSetting {
    fn from(enabled: bool) -> Self {
        HeaderSetting::Toggle(enabled)
    }
}

impl From<&str> for HeaderSetting {
    fn from(name: &str) -> Self {
        HeaderSetting::Name(name.to_string())
    }
}

/// Per-kind header settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HeadersConfig {
    pub forwarded: HeaderSetting,
    pub x_forwarded_for: HeaderSetting,
    pub x_forwarded_host: HeaderSetting,
    pub x_forwarded_proto: HeaderSetting,
    pub x_forwarded_port: HeaderSetting,
}

impl HeadersConfig {
    /// Every kind enabled under its canonical name.
    pub fn all() -> Self {
        Self {
            forwarded: true.into(),
            x_forwarded_for: true.into(),
            x_forwarded_host: true.into(),
            x_forwarded_proto: true.into(),
            x_forwarded_port: true.into(),
        }
    }

    pub fn get(&self, kind: HeaderKind) -> &HeaderSetting {
        match kind {
            HeaderKind::Forwarded => &self.forwarded,
            HeaderKind::XForwardedFor => &self.x_forwarded_for,
            HeaderKind::XForwardedHost => &self.x_forwarded_host,
            HeaderKind::XForwardedProto => &self.x_forwarded_proto,
            HeaderKind::XForwardedPort => &self.x_forwarded_port,
        }
    }

    pub fn set(&mut self, kind: HeaderKind, setting: impl Into<HeaderSetting>) {
        let slot = match kind {
            HeaderKind::Forwarded => &mut self.forwarded,
            HeaderKind::XForwardedFor => &mut self.x_forwarded_for,
            HeaderKind::XForwardedHost => &mut self.x_forwarded_host,
            HeaderKind::XForwardedProto => &mut self.x_forwarded_proto,
            HeaderKind::XForwardedPort => &mut self.x_forwarded_port,
        };
        *slot = setting.into();
    }

    /// Settings in bit order.
    pub fn iter(&self) -> impl Iterator<Item = (HeaderKind, &HeaderSetting)> {
        HeaderKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// The set of kinds with a truthy setting.
    pub fn enabled(&self) -> HeaderSet {
        self.iter()
            .filter(|(_, setting)| setting.is_enabled())
            .map(|(kind, _)| kind)
            .collect()
    }
}

/// Trusted proxy settings: the base policy, preset selection, and presets.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TrustedProxiesConfig {
    /// Trusted proxy IPs, CIDR blocks, or `*`.
    pub proxies: Vec<String>,

    /// Number of hops closest to this server to trust (0 = disabled).
    pub trust_last_proxies: u32,

    /// Which forwarded headers to use, optionally under custom names.
    pub headers: HeadersConfig,

    /// `Forwarded` directives that authenticate the hop which inserted an entry.
    pub trust_directives: BTreeMap<String, String>,

    /// Preset used when no secret header selects one.
    pub default_preset: Option<String>,

    /// Headers carrying a preset secret, tried in order.
    pub preset_secret_headers: Vec<String>,

    /// Named presets, in configuration order.
    pub presets: Vec<PresetConfig>,
}

impl TrustedProxiesConfig {
    pub fn preset(&self, name: &str) -> Option<&PresetConfig> {
        self.presets.iter().find(|preset| preset.name == name)
    }
}

/// A named, secret-gated bundle of trust settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PresetConfig {
    /// Preset identifier, referenced by `default_preset`.
    pub name: String,

    /// Value a preset secret header must carry to select this preset.
    #[serde(default)]
    pub secret: Option<String>,

    #[serde(default)]
    pub proxies: Vec<String>,

    #[serde(default)]
    pub trust_last_proxies: u32,

    #[serde(default)]
    pub headers: HeadersConfig,

    #[serde(default)]
    pub trust_directives: BTreeMap<String, String>,
}

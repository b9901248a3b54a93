//! Trust policy selection.
//!
//! # Responsibilities
//! - Pick the policy for a request: secret-selected preset, default preset, or base
//! - Fill missing preset fields with empty defaults
//!
//! # Design Decisions
//! - Tiers are candidate producers tried in order; the first `Some` wins
//! - Absent or unknown data falls through to the next tier, never errors
//! - Secrets compare byte-exactly in constant time

use constant_time_eq::constant_time_eq;
use serde::Serialize;

use crate::config::schema::{HeadersConfig, PresetConfig, TrustedProxiesConfig};
use crate::trust::forwarded::TrustDirectives;
use crate::trust::request::InboundRequest;

/// Where the active policy came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicySource {
    /// A preset whose secret matched the value of `header`.
    SecretHeader { header: String, preset: String },
    /// The configured default preset.
    DefaultPreset { preset: String },
    /// The base settings of the trusted proxies section.
    Base,
}

impl PolicySource {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PolicySource::SecretHeader { .. } => "secret_header",
            PolicySource::DefaultPreset { .. } => "default_preset",
            PolicySource::Base => "base",
        }
    }
}

/// The trust settings applied to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicy {
    pub proxies: Vec<String>,
    pub trust_last_proxies: u32,
    pub headers: HeadersConfig,
    pub trust_directives: TrustDirectives,
    pub source: PolicySource,
}

impl TrustPolicy {
    /// The base policy of the trusted proxies section.
    pub fn base(config: &TrustedProxiesConfig) -> Self {
        Self {
            proxies: config.proxies.clone(),
            trust_last_proxies: config.trust_last_proxies,
            headers: config.headers.clone(),
            trust_directives: TrustDirectives::new(&config.trust_directives),
            source: PolicySource::Base,
        }
    }

    pub fn from_preset(preset: &PresetConfig, source: PolicySource) -> Self {
        Self {
            proxies: preset.proxies.clone(),
            trust_last_proxies: preset.trust_last_proxies,
            headers: preset.headers.clone(),
            trust_directives: TrustDirectives::new(&preset.trust_directives),
            source,
        }
    }
}

type Candidate<R> = fn(&TrustedProxiesConfig, &R) -> Option<TrustPolicy>;

/// Choose the policy for a request.
pub fn select_policy<R: InboundRequest>(config: &TrustedProxiesConfig, request: &R) -> TrustPolicy {
    let tiers: [Candidate<R>; 2] = [from_secret_header::<R>, from_default_preset::<R>];

    tiers
        .iter()
        .find_map(|tier| tier(config, request))
        .unwrap_or_else(|| TrustPolicy::base(config))
}

/// First preset whose secret equals the value of a preset secret header.
///
/// Headers are tried in configured order; a header whose value matches no
/// preset hands over to the next one.
fn from_secret_header<R: InboundRequest>(
    config: &TrustedProxiesConfig,
    request: &R,
) -> Option<TrustPolicy> {
    config.preset_secret_headers.iter().find_map(|header| {
        let secret = request.header(header).filter(|value| !value.is_empty())?;
        let preset = config.presets.iter().find(|preset| {
            preset
                .secret
                .as_deref()
                .is_some_and(|candidate| constant_time_eq(candidate.as_bytes(), secret.as_bytes()))
        })?;

        Some(TrustPolicy::from_preset(
            preset,
            PolicySource::SecretHeader {
                header: header.clone(),
                preset: preset.name.clone(),
            },
        ))
    })
}

fn from_default_preset<R: InboundRequest>(
    config: &TrustedProxiesConfig,
    _request: &R,
) -> Option<TrustPolicy> {
    let name = config.default_preset.as_deref().filter(|name| !name.is_empty())?;
    let preset = config.preset(name)?;

    Some(TrustPolicy::from_preset(
        preset,
        PolicySource::DefaultPreset {
            preset: preset.name.clone(),
        },
    ))
}

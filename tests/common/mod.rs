//! Shared builders for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::{HeaderName, HeaderValue, Request};
use proxy_trust::config::{HeadersConfig, PresetConfig, TrustedProxiesConfig};
use proxy_trust::trust::forwarded::{forwarded_for_ips, x_forwarded_for_ips};
use proxy_trust::trust::{HeaderKind, InboundRequest, ResolvedTrust};

/// Address of the proxy directly connected to the server.
pub const PEER: &str = "192.168.10.10";

/// A request as received through a proxy at `PEER`, with X-Forwarded-*
/// defaults that `overrides` replace or extend.
pub fn proxied_request(overrides: &[(&str, &str)]) -> Request<()> {
    let defaults = [
        ("x-forwarded-for", "173.174.200.38"),
        ("x-forwarded-host", "serversforhackers.com"),
        ("x-forwarded-port", "443"),
        ("x-forwarded-proto", "https"),
        ("host", "localhost"),
    ];

    let mut request = Request::builder()
        .uri("http://localhost:8888/tag/proxy")
        .body(())
        .unwrap();
    for (name, value) in defaults.iter().chain(overrides) {
        let name = HeaderName::from_bytes(name.replace('_', "-").to_lowercase().as_bytes()).unwrap();
        request
            .headers_mut()
            .insert(name, HeaderValue::from_str(value).unwrap());
    }

    let peer: SocketAddr = format!("{PEER}:8888").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(peer));
    request
}

pub fn directives(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

/// Base trusted proxies settings without presets.
pub fn base_config(
    headers: HeadersConfig,
    trust_last_proxies: u32,
    proxies: &[&str],
    trust_directives: &[(&str, &str)],
) -> TrustedProxiesConfig {
    TrustedProxiesConfig {
        proxies: strings(proxies),
        trust_last_proxies,
        headers,
        trust_directives: directives(trust_directives),
        ..Default::default()
    }
}

/// Settings whose only source of policy is presets.
///
/// `defaultPreset` is empty, `preset1` has a different secret, and `preset2`
/// carries the given settings behind `secretValue`.
pub fn preset_config(preset2: PresetConfig, default_preset: Option<&str>) -> TrustedProxiesConfig {
    TrustedProxiesConfig {
        default_preset: default_preset.map(str::to_string),
        preset_secret_headers: strings(&["X_MY_OTHER_HEADER", "x-my-preset-header"]),
        presets: vec![
            PresetConfig {
                name: "defaultPreset".to_string(),
                ..Default::default()
            },
            PresetConfig {
                name: "preset1".to_string(),
                secret: Some("abc".to_string()),
                ..Default::default()
            },
            PresetConfig {
                name: "preset2".to_string(),
                secret: Some("secretValue".to_string()),
                ..preset2
            },
        ],
        ..Default::default()
    }
}

/// Header names used by the override tests.
pub fn custom_x_headers() -> HeadersConfig {
    let mut headers = HeadersConfig::default();
    headers.set(HeaderKind::XForwardedFor, "X_MY_FORWARDED_FOR");
    headers.set(HeaderKind::XForwardedHost, "X_MY_FORWARDED_HOST");
    headers.set(HeaderKind::XForwardedProto, "X_MY_FORWARDED_PROTO");
    headers.set(HeaderKind::XForwardedPort, "X_MY_FORWARDED_PORT");
    headers
}

pub fn forwarded_only() -> HeadersConfig {
    let mut headers = HeadersConfig::default();
    headers.set(HeaderKind::Forwarded, true);
    headers
}

/// Client address as a consumer of `ResolvedTrust` would compute it: walk
/// the trusted hop list from the server side and stop at the first hop that
/// is not trusted. When every hop is trusted the outermost one is the client.
pub fn client_ip<R: InboundRequest>(request: &R, trust: &ResolvedTrust) -> Option<String> {
    let peer = request.peer_address()?;
    let peer_ip: IpAddr = peer.parse().ok()?;
    if !trust.is_trusted(&peer_ip) {
        return Some(peer);
    }

    let forwarded = request
        .header("forwarded")
        .filter(|_| trust.trusts(HeaderKind::Forwarded))
        .map(|value| forwarded_for_ips(&value));
    let x_forwarded_for = request
        .header("x-forwarded-for")
        .filter(|_| trust.trusts(HeaderKind::XForwardedFor))
        .map(|value| x_forwarded_for_ips(&value));

    let hops = match forwarded.or(x_forwarded_for) {
        Some(hops) if !hops.is_empty() => hops,
        _ => return Some(peer),
    };

    for hop in hops.iter().rev() {
        match hop.parse::<IpAddr>() {
            Ok(ip) if trust.is_trusted(&ip) => continue,
            _ => return Some(hop.clone()),
        }
    }
    hops.first().cloned()
}

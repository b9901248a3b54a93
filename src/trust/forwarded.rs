//! `Forwarded` and `X-Forwarded-For` chain parsing.
//!
//! # Responsibilities
//! - Split a `Forwarded` value into entries and `name=value` directives
//! - Extract the `for=` node of each entry as a bare IP token
//! - Walk the chain right-to-left to find hops vouched for by trust directives
//! - Split `X-Forwarded-For` into its hop list
//!
//! # Design Decisions
//! - Commas and semicolons are split naively; a quoted comma is not special
//! - Malformed entries contribute nothing; parsing never fails as a whole
//! - Directive names and values compare case-insensitively, quotes stripped

use std::collections::BTreeMap;
use std::net::IpAddr;

/// Characters trimmed from directive values: whitespace, NUL, and quotes.
fn is_value_padding(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\0' | '\x0B' | '"')
}

fn normalize_value(value: &str) -> String {
    value.trim_matches(is_value_padding).to_lowercase()
}

/// One directive of a `Forwarded` entry, with name and value normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub value: String,
}

impl Directive {
    /// Parse `name=value`, splitting on the first `=` only.
    pub fn parse(raw: &str) -> Self {
        let (name, value) = raw.split_once('=').unwrap_or((raw, ""));
        Self {
            name: name.trim().to_lowercase(),
            value: normalize_value(value),
        }
    }
}

/// One comma-separated element of a `Forwarded` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedEntry {
    directives: Vec<Directive>,
}

impl ForwardedEntry {
    pub fn parse(raw: &str) -> Self {
        Self {
            directives: raw.split(';').map(Directive::parse).collect(),
        }
    }

    /// Value of the first directive with the given lowercase name.
    pub fn directive(&self, name: &str) -> Option<&str> {
        self.directives
            .iter()
            .find(|directive| directive.name == name)
            .map(|directive| directive.value.as_str())
    }

    /// The entry's `for=` node as a bare IP token.
    pub fn for_ip(&self) -> Option<String> {
        self.directive("for").and_then(node_ip)
    }

    /// Whether any directive carries a configured trust directive.
    pub fn carries_any(&self, trusted: &TrustDirectives) -> bool {
        self.directives.iter().any(|directive| trusted.matches(directive))
    }
}

/// Split a `Forwarded` header value into its entries, in header order.
pub fn entries(value: &str) -> impl DoubleEndedIterator<Item = ForwardedEntry> + '_ {
    value.split(',').map(ForwardedEntry::parse)
}

/// Reduce a `for=` node to its address: drop an IPv6 bracket and any port.
///
/// `"[2001:db8:cafe::17]:4711"` becomes `2001:db8:cafe::17`,
/// `173.174.200.40:443` becomes `173.174.200.40`. A node that does not start
/// with address characters, such as the obfuscated `_hidden`, is returned as
/// is so that it keeps its position in the chain. Only an empty node yields
/// `None`.
pub fn node_ip(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    let node = raw.strip_prefix('[').unwrap_or(raw);
    let end = node
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == ':' || c == '.'))
        .unwrap_or(node.len());
    let run = &node[..end];

    if run.is_empty() {
        return Some(raw.to_string());
    }
    if run.parse::<IpAddr>().is_ok() {
        return Some(run.to_string());
    }
    // host:port with a single colon; IPv6 literals always carry more than one
    match run.split_once(':') {
        Some((host, _port)) if !host.is_empty() && run.matches(':').count() == 1 => Some(host.to_string()),
        _ => Some(run.to_string()),
    }
}

/// IPs of the `for=` directives, in header order. Entries without one are skipped.
pub fn forwarded_for_ips(value: &str) -> Vec<String> {
    entries(value).filter_map(|entry| entry.for_ip()).collect()
}

/// Hops of an `X-Forwarded-For` value, in header order, trimmed.
///
/// Empty hops are kept so that positions stay aligned with the header.
pub fn x_forwarded_for_ips(value: &str) -> Vec<String> {
    value.split(',').map(|hop| hop.trim().to_string()).collect()
}

/// Configured trust directives, normalized for comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustDirectives(BTreeMap<String, String>);

impl TrustDirectives {
    pub fn new<'a, I>(directives: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        Self(
            directives
                .into_iter()
                .map(|(name, value)| (name.trim().to_lowercase(), normalize_value(value)))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, directive: &Directive) -> bool {
        self.0
            .get(&directive.name)
            .is_some_and(|value| *value == directive.value)
    }
}

/// Hops vouched for by trust directives.
///
/// Entries are walked from the one closest to this server back toward the
/// client. An entry carrying a trusted directive vouches for the hop that
/// inserted it, which is the node recorded by the previously walked entry
/// (or the peer, for the last entry).
pub fn directive_trusted_ips(value: &str, peer: Option<&str>, trusted: &TrustDirectives) -> Vec<String> {
    let mut last_proxy = peer.map(str::to_string);
    let mut ips = Vec::new();

    for entry in entries(value).rev() {
        if entry.carries_any(trusted) {
            if let Some(ip) = &last_proxy {
                ips.push(ip.clone());
            }
        }
        last_proxy = entry.for_ip();
    }

    ips
}

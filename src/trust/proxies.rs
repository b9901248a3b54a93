//! Trusted proxy entries and membership tests.

use std::net::IpAddr;

use ipnet::IpNet;

/// A parsed trusted proxy entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyMatcher {
    /// `*`: every address.
    Any,
    /// A single address or CIDR block.
    Net(IpNet),
}

impl ProxyMatcher {
    /// Parse an IP, a CIDR block, or `*`.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry == "*" {
            return Some(ProxyMatcher::Any);
        }
        if let Ok(net) = entry.parse::<IpNet>() {
            return Some(ProxyMatcher::Net(net));
        }
        entry.parse::<IpAddr>().ok().map(|ip| ProxyMatcher::Net(IpNet::from(ip)))
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        match self {
            ProxyMatcher::Any => true,
            ProxyMatcher::Net(net) => net.contains(ip),
        }
    }
}

/// Whether any entry covers `ip`. Unparseable entries never match.
pub fn is_trusted<S: AsRef<str>>(entries: &[S], ip: &IpAddr) -> bool {
    entries
        .iter()
        .filter_map(|entry| ProxyMatcher::parse(entry.as_ref()))
        .any(|matcher| matcher.contains(ip))
}

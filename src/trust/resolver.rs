//! Trusted proxy chain resolution.
//!
//! # Responsibilities
//! - Copy custom-named forwarded headers onto their canonical names
//! - Compute the set of trusted header kinds
//! - Expand the trusted proxy list: static entries, last N hops, directive-vouched hops
//!
//! # Design Decisions
//! - A configured override always wins; a missing custom header removes the canonical one
//! - Hop lists are read from canonical names after overrides are applied
//! - Contributions are appended without deduplication; consumers test membership

use std::net::IpAddr;

use serde::Serialize;

use crate::observability::metrics;
use crate::trust::forwarded::{directive_trusted_ips, forwarded_for_ips, x_forwarded_for_ips};
use crate::trust::header::{HeaderKind, HeaderSet};
use crate::trust::policy::TrustPolicy;
use crate::trust::proxies;
use crate::trust::request::InboundRequest;

/// The trusted view of a request's proxy chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedTrust {
    /// Trusted proxy IPs and CIDR blocks, `*` for any.
    pub trusted_proxies: Vec<String>,
    /// Header kinds whose values may be used.
    pub trusted_headers: HeaderSet,
}

impl ResolvedTrust {
    pub fn is_trusted(&self, ip: &IpAddr) -> bool {
        proxies::is_trusted(&self.trusted_proxies, ip)
    }

    pub fn trusts(&self, kind: HeaderKind) -> bool {
        self.trusted_headers.contains(kind)
    }
}

/// Applies one policy to a request.
#[derive(Debug, Clone, Copy)]
pub struct ChainResolver<'a> {
    policy: &'a TrustPolicy,
}

impl<'a> ChainResolver<'a> {
    pub fn new(policy: &'a TrustPolicy) -> Self {
        Self { policy }
    }

    /// Rewrite overridden headers on `request` and compute its trusted view.
    pub fn resolve<R: InboundRequest>(&self, request: &mut R) -> ResolvedTrust {
        self.apply_header_overrides(request);

        let trusted_headers = self.trusted_headers();
        let mut trusted_proxies = self.policy.proxies.clone();
        trusted_proxies.extend(self.trust_last_proxies(request, trusted_headers));
        trusted_proxies.extend(self.trust_by_directives(request, trusted_headers));

        ResolvedTrust {
            trusted_proxies,
            trusted_headers,
        }
    }

    /// Copy each custom-named header onto its canonical name, or clear the
    /// canonical header when the custom one is missing.
    pub fn apply_header_overrides<R: InboundRequest>(&self, request: &mut R) {
        for (kind, setting) in self.policy.headers.iter() {
            let Some(custom) = setting.custom_name() else {
                continue;
            };
            let canonical = kind.canonical_name();

            match request.header(custom).filter(|value| !value.is_empty()) {
                Some(value) => {
                    tracing::debug!(header = %kind, source = %custom, "Overriding forwarded header");
                    request.set_header(canonical, &value);
                    metrics::record_header_override(canonical, "copied");
                }
                None => {
                    if request.header(canonical).is_some() {
                        tracing::debug!(header = %kind, source = %custom, "Removing forwarded header without override value");
                        metrics::record_header_override(canonical, "removed");
                    }
                    // also drops values that were not readable as text
                    request.remove_header(canonical);
                }
            }
        }
    }

    pub fn trusted_headers(&self) -> HeaderSet {
        self.policy.headers.enabled()
    }

    /// The peer plus the `trust_last_proxies - 1` hops closest to it.
    fn trust_last_proxies<R: InboundRequest>(&self, request: &R, enabled: HeaderSet) -> Vec<String> {
        let count = self.policy.trust_last_proxies;
        if count == 0 {
            return Vec::new();
        }

        let mut trusted: Vec<String> = request.peer_address().into_iter().collect();

        let levels = (count - 1) as usize;
        if levels > 0 {
            if enabled.contains(HeaderKind::XForwardedFor) {
                if let Some(value) = request.header(HeaderKind::XForwardedFor.canonical_name()) {
                    trusted.extend(last(x_forwarded_for_ips(&value), levels).filter(|ip| !ip.is_empty()));
                }
            }
            if enabled.contains(HeaderKind::Forwarded) {
                if let Some(value) = request.header(HeaderKind::Forwarded.canonical_name()) {
                    trusted.extend(last(forwarded_for_ips(&value), levels));
                }
            }
        }

        trusted
    }

    fn trust_by_directives<R: InboundRequest>(&self, request: &R, enabled: HeaderSet) -> Vec<String> {
        if !enabled.contains(HeaderKind::Forwarded) || self.policy.trust_directives.is_empty() {
            return Vec::new();
        }

        match request.header(HeaderKind::Forwarded.canonical_name()) {
            Some(value) => directive_trusted_ips(
                &value,
                request.peer_address().as_deref(),
                &self.policy.trust_directives,
            ),
            None => Vec::new(),
        }
    }
}

/// The last `n` items, in their original order.
fn last(items: Vec<String>, n: usize) -> impl Iterator<Item = String> {
    let skip = items.len().saturating_sub(n);
    items.into_iter().skip(skip)
}

/// Apply `policy` to `request`.
pub fn resolve<R: InboundRequest>(policy: &TrustPolicy, request: &mut R) -> ResolvedTrust {
    ChainResolver::new(policy).resolve(request)
}

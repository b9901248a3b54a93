//! JSON report of a resolved request.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::trust::{HeaderKind, InboundRequest, PolicySource, ResolvedTrust};

/// What the trust resolver decided for one request.
#[derive(Debug, Clone, Serialize)]
pub struct TrustReport {
    /// Directly connected peer.
    pub peer: Option<String>,
    /// Policy that was applied.
    pub policy: PolicySource,
    #[serde(flatten)]
    pub trust: ResolvedTrust,
    /// Canonical forwarded headers as left after overrides.
    pub forwarded_headers: BTreeMap<&'static str, String>,
}

impl TrustReport {
    pub fn new<R: InboundRequest>(request: &R, policy: PolicySource, trust: ResolvedTrust) -> Self {
        let forwarded_headers = HeaderKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let name = kind.canonical_name();
                request.header(name).map(|value| (name, value))
            })
            .collect();

        Self {
            peer: request.peer_address(),
            policy,
            trust,
            forwarded_headers,
        }
    }
}

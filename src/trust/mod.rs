//! Proxy chain trust subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request + config snapshot:
//!     → policy.rs (secret header preset → default preset → base)
//!     → resolver.rs (header overrides, trusted header set)
//!     → resolver.rs (static proxies + last N hops + directive-vouched hops)
//!         ↳ forwarded.rs (Forwarded / X-Forwarded-For chain parsing)
//!     → ResolvedTrust handed to the request consumer
//! ```
//!
//! # Design Decisions
//! - Pure and synchronous: no I/O, bounded by header length
//! - Nothing is fatal; malformed input under-trusts instead of failing
//! - The only side effect is the header rewrite on the request itself

pub mod forwarded;
pub mod header;
pub mod policy;
pub mod proxies;
pub mod request;
pub mod resolver;

pub use header::{HeaderKind, HeaderSet};
pub use policy::{select_policy, PolicySource, TrustPolicy};
pub use request::InboundRequest;
pub use resolver::{resolve, ChainResolver, ResolvedTrust};

use crate::config::schema::TrustedProxiesConfig;
use crate::observability::metrics;

/// Select the policy for `request`, then resolve its trusted view.
///
/// Returns the policy source alongside the result for logging and reporting.
pub fn evaluate<R: InboundRequest>(config: &TrustedProxiesConfig, request: &mut R) -> (PolicySource, ResolvedTrust) {
    let policy = select_policy(config, request);
    tracing::debug!(source = ?policy.source, "Trust policy selected");
    metrics::record_policy_selected(policy.source.label());

    let resolved = resolve(&policy, request);
    tracing::debug!(
        trusted_proxies = ?resolved.trusted_proxies,
        trusted_headers = resolved.trusted_headers.bits(),
        "Proxy chain resolved"
    );
    metrics::record_trusted_proxies(resolved.trusted_proxies.len());

    (policy.source, resolved)
}

//! Proxy chain trust resolution.
//!
//! Decides which proxy-supplied headers (`Forwarded`, `X-Forwarded-*`) and
//! which proxy hops a request may be trusted through, given a configured
//! policy: an IP/CIDR allow-list, "trust the last N hops", or `Forwarded`
//! directives that vouch for the hop that inserted an entry.

pub mod config;
pub mod http;
pub mod observability;
pub mod trust;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use trust::{evaluate, ResolvedTrust};

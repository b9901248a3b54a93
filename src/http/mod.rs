//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info, trace/timeout layers)
//!     → middleware.rs (select policy, rewrite headers, resolve trust)
//!     → report.rs (inspection handler renders the decision as JSON)
//! ```

pub mod middleware;
pub mod report;
pub mod server;

pub use middleware::{trusted_proxies_middleware, TrustState};
pub use report::TrustReport;
pub use server::HttpServer;

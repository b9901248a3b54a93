//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → trusted proxies section shared via ArcSwap with request handlers
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the shared snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::HeaderSetting;
pub use schema::HeadersConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::PresetConfig;
pub use schema::ServiceConfig;
pub use schema::TimeoutConfig;
pub use schema::TrustedProxiesConfig;

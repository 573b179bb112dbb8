//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → loader.rs (optional TOML file, then PORT env, then --port)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → cloned into HttpServer, which hands timeouts and buffer size to
//!       the connector, the session tracker and each session's pump
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so the bridge runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve_config, ConfigError};
pub use schema::BridgeConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::RelayConfig;
pub use schema::TimeoutConfig;
pub use schema::TlsConfig;

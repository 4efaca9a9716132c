//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! proxy config file (TOML) + environment
//!     → loader.rs (parse, env overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! resource allow-list file (TOML)
//!     → loader.rs → validation.rs
//!     → StaticResourceConfig (read-only)
//!     → routing::ConfigResolver
//!
//! On resource file change (resources.watch = true):
//!     watcher.rs detects change
//!     → reload + validate
//!     → re-resolve against the current snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A bad resource file never stops the process; it selects legacy mode

pub mod loader;
pub mod resources;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_resources, load_with_env, ConfigError};
pub use resources::{ResourceEntry, StaticResourceConfig};
pub use schema::{
    ListenerConfig, ObservabilityConfig, ProxyConfig, ResourcesConfig, SchemaSettings,
    SecurityConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::ConfigIssue;

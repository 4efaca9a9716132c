//! Schema-aware proxy for a NocoDB-style data API.
//!
//! Clients address records by stable logical names; the proxy resolves them
//! to backend identifiers from a periodically refreshed schema snapshot and,
//! when a resource allow-list is configured, enforces per-resource operations.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod schema;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

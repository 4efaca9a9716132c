//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend data and metadata endpoints plus credentials.
    pub upstream: UpstreamConfig,

    /// Schema cache settings.
    pub schema: SchemaSettings,

    /// Declarative resource allow-list location.
    pub resources: ResourcesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL that resolved record paths are appended to.
    pub data_url: String,

    /// Metadata API base URL. Derived from `data_url` when unset.
    pub meta_url: Option<String>,

    /// Backend base identifier. Empty disables the schema cache.
    pub base_id: String,

    /// Credential sent on every backend call.
    pub token: String,

    /// Header carrying the credential. `authorization` sends a bearer token.
    pub token_header: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            data_url: "http://localhost:8090/api/v2/tables/".to_string(),
            meta_url: None,
            base_id: String::new(),
            token: String::new(),
            token_header: "xc-token".to_string(),
        }
    }
}

impl UpstreamConfig {
    /// Metadata API base URL.
    ///
    /// Without an explicit `meta_url`, everything in `data_url` up to and
    /// including `/api/` is kept and `v2/` appended.
    pub fn metadata_url(&self) -> String {
        if let Some(url) = self.meta_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.to_string();
        }
        match self.data_url.find("/api/") {
            Some(idx) => format!("{}v2/", &self.data_url[..idx + "/api/".len()]),
            None => format!("{}/api/v2/", self.data_url.trim_end_matches('/')),
        }
    }

    /// Whether schema resolution is possible at all.
    pub fn schema_enabled(&self) -> bool {
        !self.base_id.trim().is_empty()
    }

    /// Token suitable for logs.
    pub fn masked_token(&self) -> String {
        match self.token.len() {
            0 => "<unset>".to_string(),
            n if n <= 8 => "****".to_string(),
            n => match (self.token.get(..4), self.token.get(n - 4..)) {
                (Some(head), Some(tail)) => format!("{}****{}", head, tail),
                _ => "****".to_string(),
            },
        }
    }
}

/// Schema cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Background refresh interval in seconds.
    pub refresh_interval_secs: u64,

    /// Timeout for each metadata request in seconds.
    pub fetch_timeout_secs: u64,

    /// Maximum concurrent table detail requests during a load.
    pub detail_concurrency: usize,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 600,
            fetch_timeout_secs: 10,
            detail_concurrency: 4,
        }
    }
}

/// Resource allow-list file settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Path to the resources TOML file. A missing file selects legacy mode.
    pub path: String,

    /// Re-resolve when the file changes.
    pub watch: bool,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            path: "./config/resources.toml".to_string(),
            watch: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request hardening.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

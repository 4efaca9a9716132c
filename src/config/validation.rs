//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0, addresses parse)
//! - Require a plain http data URL for forwarded traffic
//! - Check the resource list for empty or duplicate keys
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the parsed config

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use url::Url;

use crate::config::resources::StaticResourceConfig;
use crate::config::schema::ProxyConfig;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate proxy settings.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.upstream.data_url) {
        Err(e) => issues.push(ConfigIssue::new("upstream.data_url", e.to_string())),
        // Record traffic goes through a plain HTTP connector.
        Ok(url) if url.scheme() != "http" => issues.push(ConfigIssue::new(
            "upstream.data_url",
            format!("scheme '{}' is not supported, use an http:// backend URL", url.scheme()),
        )),
        Ok(_) => {}
    }
    if let Some(meta_url) = config.upstream.meta_url.as_deref() {
        if let Err(e) = Url::parse(meta_url) {
            issues.push(ConfigIssue::new("upstream.meta_url", e.to_string()));
        }
    }
    if HeaderName::from_bytes(config.upstream.token_header.as_bytes()).is_err() {
        issues.push(ConfigIssue::new(
            "upstream.token_header",
            format!("'{}' is not a valid header name", config.upstream.token_header),
        ));
    }
    if HeaderValue::from_str(&config.upstream.token).is_err() {
        issues.push(ConfigIssue::new("upstream.token", "contains characters not allowed in a header"));
    }

    let non_zero = [
        ("schema.refresh_interval_secs", config.schema.refresh_interval_secs),
        ("schema.fetch_timeout_secs", config.schema.fetch_timeout_secs),
        ("schema.detail_concurrency", config.schema.detail_concurrency as u64),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            issues.push(ConfigIssue::new(field, "must be greater than zero"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        issues.push(ConfigIssue::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Validate the resource list.
pub fn validate_resources(config: &StaticResourceConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for (i, resource) in config.resources.iter().enumerate() {
        let field = format!("resources[{}]", i);
        if resource.key.trim().is_empty() {
            issues.push(ConfigIssue::new(&field, "key must not be empty"));
        } else if resource.key.contains('/') {
            issues.push(ConfigIssue::new(
                &field,
                format!("key '{}' must not contain '/'", resource.key),
            ));
        } else if !seen.insert(resource.key.as_str()) {
            issues.push(ConfigIssue::new(
                &field,
                format!("duplicate key '{}'", resource.key),
            ));
        }
        if resource.table.trim().is_empty() {
            issues.push(ConfigIssue::new(&field, "table must not be empty"));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

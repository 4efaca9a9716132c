//! Schema loading errors.

use thiserror::Error;

/// Errors raised while fetching or assembling a schema snapshot.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    /// Metadata URL could not be built from configuration.
    #[error("invalid metadata URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Metadata endpoint unreachable or the request could not be sent.
    #[error("metadata request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Metadata endpoint answered with a non-success status.
    #[error("metadata API {url} returned status {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// Payload could not be parsed into table descriptors.
    #[error("failed to parse metadata from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaLoadError>;

//! Client-facing error responses.
//!
//! Every rejection is rendered as `{"error": {"code": ..., "message": ...}}`
//! so callers can branch on the code without parsing messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::routing::RouteError;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("invalid upstream credential header: {0}")]
    Credential(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Route(RouteError::Rejected(_)) => StatusCode::FORBIDDEN,
            ProxyError::Route(RouteError::UnresolvedLegacyAlias { .. }) => StatusCode::BAD_REQUEST,
            ProxyError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Credential(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ProxyError::Route(RouteError::Rejected(e)) => e.code(),
            ProxyError::Route(RouteError::UnresolvedLegacyAlias { .. }) => "UNKNOWN_LINK_FIELD",
            ProxyError::InvalidTarget(_) => "INVALID_PATH",
            ProxyError::Upstream(_) => "UPSTREAM_UNAVAILABLE",
            ProxyError::Credential(_) => "PROXY_MISCONFIGURED",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

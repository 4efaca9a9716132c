//! Read-only introspection endpoints.
//!
//! Reports the routing mode, schema cache state and the installed resource
//! allow-list. Nothing here can change proxy state.

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::{get_schema, get_status};
use crate::http::server::AppState;

pub const STATUS_PATH: &str = "/__proxy/status";
pub const SCHEMA_PATH: &str = "/__proxy/schema";

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route(STATUS_PATH, get(get_status))
        .route(SCHEMA_PATH, get(get_schema))
}

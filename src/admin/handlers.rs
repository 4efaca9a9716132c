//! Read-only introspection handlers: routing mode, schema cache state and
//! installed resources.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;
use crate::routing::{Operation, RoutingMode};
use crate::schema::{FieldKind, SchemaStats};

#[derive(Debug, Serialize)]
pub struct ProxyStatus {
    pub version: &'static str,
    pub mode: RoutingMode,
    pub schema: SchemaStats,
    pub resolved: Option<ResolvedSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSummary {
    pub base_id: String,
    pub resources: usize,
}

#[derive(Debug, Serialize)]
pub struct SchemaReport {
    pub mode: RoutingMode,
    pub resources: Vec<ResourceReport>,
    pub tables: Vec<TableReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub key: String,
    pub table_id: String,
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub id: String,
    pub display_name: String,
    pub internal_name: String,
    pub relationship_fields: Vec<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<ProxyStatus> {
    let schema = state
        .cache
        .as_ref()
        .map(|cache| cache.stats())
        .unwrap_or_default();
    let resolved = state.router.resolved_config().map(|config| ResolvedSummary {
        base_id: config.base_identifier.clone(),
        resources: config.len(),
    });

    Json(ProxyStatus {
        version: env!("CARGO_PKG_VERSION"),
        mode: state.router.mode(),
        schema,
        resolved,
    })
}

pub async fn get_schema(State(state): State<AppState>) -> Json<SchemaReport> {
    let resources = state
        .router
        .resolved_config()
        .map(|config| {
            config
                .entries
                .iter()
                .map(|(key, entry)| ResourceReport {
                    key: key.clone(),
                    table_id: entry.table_id.clone(),
                    // BTreeSet iteration is already sorted
                    operations: entry.allowed_operations.iter().copied().collect(),
                })
                .collect()
        })
        .unwrap_or_default();

    let tables = state
        .cache
        .as_ref()
        .and_then(|cache| cache.snapshot())
        .map(|snapshot| {
            snapshot
                .tables()
                .iter()
                .map(|table| TableReport {
                    id: table.id.clone(),
                    display_name: table.display_name.clone(),
                    internal_name: table.internal_name.clone(),
                    relationship_fields: table
                        .fields
                        .iter()
                        .filter(|f| f.kind == FieldKind::Relationship)
                        .map(|f| f.name.clone())
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default();

    Json(SchemaReport {
        mode: state.router.mode(),
        resources,
        tables,
    })
}

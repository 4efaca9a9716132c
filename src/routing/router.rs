//! Mode selection and dispatch to the validator or legacy resolution.
//!
//! # Responsibilities
//! - Schema-driven mode: every request goes through [`RequestValidator`]
//! - Legacy mode: best-effort table and link alias resolution with
//!   pass-through for unknown tables
//! - Swap in a new resolved configuration on an explicit re-resolve
//!
//! # Design Decisions
//! - The installed validator sits behind an `ArcSwapOption`; requests load it
//!   once and never observe a half-installed configuration
//! - Each request pins one schema snapshot and runs every lookup against it,
//!   so a concurrent refresh can never mix table and field identifiers
//! - In legacy mode an unknown table passes through untouched, but an
//!   unknown link alias on a known table is a malformed request

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use axum::http::Method;
use serde::Serialize;
use thiserror::Error;

use crate::routing::path::{resolve_link_alias, split_logical_path, LinkPath};
use crate::routing::resolver::ResolvedConfig;
use crate::routing::validator::{RequestValidator, ValidationError};
use crate::schema::{SchemaLookup, SnapshotSource};

/// Which resolution path requests take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoutingMode {
    SchemaDriven,
    Legacy,
}

impl RoutingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::SchemaDriven => "schema-driven",
            RoutingMode::Legacy => "legacy",
        }
    }
}

/// Router-level rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("unknown link field '{alias}' for table '{table}'")]
    UnresolvedLegacyAlias { table: String, alias: String },
}

/// A request that may be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedRequest {
    pub upstream_path: String,
    pub mode: RoutingMode,
    /// Base identifier from the resolved configuration, if any.
    pub base_id: Option<String>,
}

/// Chooses between schema-driven and legacy handling per request.
pub struct RequestRouter {
    schema: Option<Arc<dyn SnapshotSource>>,
    validator: ArcSwapOption<RequestValidator>,
}

impl RequestRouter {
    /// Create a router in legacy mode. `schema` is `None` when no schema
    /// cache is configured, in which case every path passes through.
    pub fn new(schema: Option<Arc<dyn SnapshotSource>>) -> Self {
        Self {
            schema,
            validator: ArcSwapOption::empty(),
        }
    }

    /// Switch to schema-driven mode with `config`.
    ///
    /// Returns false when there is no schema lookup to resolve link fields
    /// against; the router then stays in its current mode.
    pub fn install(&self, config: ResolvedConfig) -> bool {
        if self.schema.is_none() {
            tracing::warn!("Cannot enable schema-driven mode without a schema cache");
            return false;
        }
        let resources = config.len();
        let validator = RequestValidator::new(Arc::new(config));
        self.validator.store(Some(Arc::new(validator)));
        tracing::info!(resources, "Resolved configuration installed, schema-driven mode active");
        true
    }

    pub fn mode(&self) -> RoutingMode {
        if self.validator.load().is_some() {
            RoutingMode::SchemaDriven
        } else {
            RoutingMode::Legacy
        }
    }

    /// The installed resolved configuration, if in schema-driven mode.
    pub fn resolved_config(&self) -> Option<Arc<ResolvedConfig>> {
        self.validator
            .load_full()
            .map(|validator| Arc::clone(validator.config()))
    }

    /// Resolve a client path (without the `/proxy/` prefix) to an upstream path.
    pub fn route(&self, method: &Method, path: &str) -> Result<RoutedRequest, RouteError> {
        let snapshot = self.schema.as_ref().and_then(|schema| schema.current());
        let lookup = snapshot.as_deref().map(|s| s as &dyn SchemaLookup);

        if let Some(validator) = self.validator.load_full() {
            let outcome = validator.validate(method, path, lookup)?;
            tracing::debug!(
                path = %path,
                upstream_path = %outcome.resolved_upstream_path,
                operation = %outcome.operation,
                "Validated request"
            );
            return Ok(RoutedRequest {
                upstream_path: outcome.resolved_upstream_path,
                mode: RoutingMode::SchemaDriven,
                base_id: Some(validator.config().base_identifier.clone()),
            });
        }

        Ok(RoutedRequest {
            upstream_path: route_legacy(path, lookup)?,
            mode: RoutingMode::Legacy,
            base_id: None,
        })
    }
}

fn route_legacy(path: &str, lookup: Option<&dyn SchemaLookup>) -> Result<String, RouteError> {
    let Some(lookup) = lookup else {
        return Ok(path.to_string());
    };

    let (table, remainder) = split_logical_path(path);
    if table.is_empty() {
        return Ok(path.to_string());
    }

    let Some(table_id) = lookup.resolve_table(table) else {
        tracing::debug!(table = %table, "No mapping found for table, using raw path");
        return Ok(path.to_string());
    };

    let Some(remainder) = remainder else {
        return Ok(table_id);
    };

    let remainder = match LinkPath::parse(remainder) {
        Some(link) => {
            let field_id = resolve_link_alias(lookup, &table_id, link.alias).ok_or_else(|| {
                RouteError::UnresolvedLegacyAlias {
                    table: table.to_string(),
                    alias: link.alias.to_string(),
                }
            })?;
            tracing::debug!(table = %table, alias = %link.alias, field_id = %field_id, "Resolved link field");
            link.rewrite(&field_id)
        }
        None => remainder.to_string(),
    };

    Ok(format!("{}/{}", table_id, remainder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::routing::operation::Operation;
    use crate::routing::resolver::ResolvedEntry;
    use crate::schema::{
        FieldDescriptor, FieldKind, SchemaSnapshot, SnapshotBuilder, TableDescriptor,
    };

    /// "Products" as table `table_id` with link field `field_id`.
    fn products(table_id: &str, field_id: &str) -> SchemaSnapshot {
        let mut builder = SnapshotBuilder::new("p1");
        builder
            .add_table(TableDescriptor {
                id: table_id.into(),
                display_name: "Products".into(),
                internal_name: "nc_products".into(),
                fields: Vec::new(),
            })
            .add_relationship_fields(
                table_id,
                vec![FieldDescriptor::new(field_id, "Related Orders", FieldKind::Relationship)],
            );
        builder.build()
    }

    fn lookup() -> Arc<dyn SnapshotSource> {
        Arc::new(ArcSwapOption::from_pointee(products("T1", "F1")))
    }

    fn resolved(ops: &[Operation]) -> ResolvedConfig {
        let mut entries = BTreeMap::new();
        entries.insert(
            "products".to_string(),
            ResolvedEntry {
                table_id: "T1".into(),
                allowed_operations: ops.iter().copied().collect(),
            },
        );
        ResolvedConfig {
            base_identifier: "p1".into(),
            entries,
        }
    }

    #[test]
    fn test_legacy_unknown_table_passes_through() {
        let router = RequestRouter::new(Some(lookup()));
        let routed = router.route(&Method::DELETE, "widgets/7").unwrap();
        assert_eq!(routed.upstream_path, "widgets/7");
        assert_eq!(routed.mode, RoutingMode::Legacy);
    }

    #[test]
    fn test_legacy_resolves_table_and_alias() {
        let router = RequestRouter::new(Some(lookup()));
        assert_eq!(router.route(&Method::GET, "PRODUCTS").unwrap().upstream_path, "T1");
        assert_eq!(
            router.route(&Method::GET, "products/42").unwrap().upstream_path,
            "T1/42"
        );
        assert_eq!(
            router
                .route(&Method::POST, "products/links/related_orders/rec9")
                .unwrap()
                .upstream_path,
            "T1/links/F1/rec9"
        );
    }

    #[test]
    fn test_legacy_unknown_alias_is_error() {
        let router = RequestRouter::new(Some(lookup()));
        let err = router
            .route(&Method::POST, "products/links/bogus/rec9")
            .unwrap_err();
        assert_eq!(
            err,
            RouteError::UnresolvedLegacyAlias {
                table: "products".into(),
                alias: "bogus".into(),
            }
        );
    }

    #[test]
    fn test_no_cache_passes_everything_through() {
        let router = RequestRouter::new(None);
        let routed = router.route(&Method::GET, "products/links/x/1").unwrap();
        assert_eq!(routed.upstream_path, "products/links/x/1");
        assert!(!router.install(resolved(&[Operation::Read])));
        assert_eq!(router.mode(), RoutingMode::Legacy);
    }

    #[test]
    fn test_schema_driven_has_no_bypass() {
        let router = RequestRouter::new(Some(lookup()));
        assert!(router.install(resolved(&[Operation::Read])));
        assert_eq!(router.mode(), RoutingMode::SchemaDriven);

        let routed = router.route(&Method::GET, "products/1").unwrap();
        assert_eq!(routed.upstream_path, "T1/1");
        assert_eq!(routed.base_id.as_deref(), Some("p1"));

        // A raw table name that legacy mode would have resolved is rejected.
        let err = router.route(&Method::GET, "nc_products/1").unwrap_err();
        assert!(matches!(err, RouteError::Rejected(ValidationError::UnknownResource(_))));
    }

    #[test]
    fn test_reinstall_swaps_configuration() {
        let router = RequestRouter::new(Some(lookup()));
        router.install(resolved(&[Operation::Read]));
        assert!(router.route(&Method::DELETE, "products/1").is_err());

        router.install(resolved(&[Operation::Read, Operation::Delete]));
        assert!(router.route(&Method::DELETE, "products/1").is_ok());
        assert_eq!(router.resolved_config().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_refresh_never_mixes_snapshots() {
        let a = Arc::new(products("T1", "F1"));
        let b = Arc::new(products("T2", "F2"));
        let current = Arc::new(ArcSwapOption::new(Some(Arc::clone(&a))));
        let router = RequestRouter::new(Some(Arc::clone(&current) as Arc<dyn SnapshotSource>));

        let stop = Arc::new(AtomicBool::new(false));
        let swapper = {
            let current = Arc::clone(&current);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                let mut use_a = false;
                while !stop.load(Ordering::Relaxed) {
                    current.store(Some(Arc::clone(if use_a { &a } else { &b })));
                    use_a = !use_a;
                }
            })
        };

        for _ in 0..50_000 {
            let routed = router
                .route(&Method::POST, "products/links/related_orders/rec9")
                .unwrap();
            assert!(
                matches!(
                    routed.upstream_path.as_str(),
                    "T1/links/F1/rec9" | "T2/links/F2/rec9"
                ),
                "mixed identifiers: {}",
                routed.upstream_path
            );
        }

        stop.store(true, Ordering::Relaxed);
        swapper.join().unwrap();
    }
}

//! Cross-checks the declarative resource list against the live schema.
//!
//! # Responsibilities
//! - Resolve each resource's backend table name to a table identifier
//! - Copy each resource's operation set verbatim
//!
//! # Design Decisions
//! - Fail fast: the first unknown table aborts the whole resolution and no
//!   partial configuration is ever returned
//! - Resolution reads one snapshot, so every entry is checked against the
//!   same schema version

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use crate::config::StaticResourceConfig;
use crate::routing::operation::Operation;
use crate::schema::SchemaSnapshot;

/// One resolved resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub table_id: String,
    pub allowed_operations: BTreeSet<Operation>,
}

impl ResolvedEntry {
    pub fn allows(&self, operation: Operation) -> bool {
        self.allowed_operations.contains(&operation)
    }
}

/// Validated configuration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub base_identifier: String,
    pub entries: BTreeMap<String, ResolvedEntry>,
}

impl ResolvedConfig {
    pub fn entry(&self, key: &str) -> Option<&ResolvedEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Errors raised while resolving the resource list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("resource '{key}' references table '{table}' which does not exist in base '{base_id}'")]
    UnknownTable {
        key: String,
        table: String,
        base_id: String,
    },
}

/// Resolves a [`StaticResourceConfig`] against one snapshot.
pub struct ConfigResolver<'a> {
    snapshot: &'a SchemaSnapshot,
}

impl<'a> ConfigResolver<'a> {
    pub fn new(snapshot: &'a SchemaSnapshot) -> Self {
        Self { snapshot }
    }

    pub fn resolve(&self, config: &StaticResourceConfig) -> Result<ResolvedConfig, ResolveError> {
        let mut entries = BTreeMap::new();

        for resource in &config.resources {
            let table_id = self.snapshot.table_id(&resource.table).ok_or_else(|| {
                ResolveError::UnknownTable {
                    key: resource.key.clone(),
                    table: resource.table.clone(),
                    base_id: self.snapshot.base_id().to_string(),
                }
            })?;

            tracing::debug!(
                key = %resource.key,
                table = %resource.table,
                table_id = %table_id,
                "Resolved resource"
            );
            entries.insert(
                resource.key.clone(),
                ResolvedEntry {
                    table_id: table_id.to_string(),
                    allowed_operations: resource.operations.clone(),
                },
            );
        }

        let base_identifier = config
            .base_id
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| self.snapshot.base_id())
            .to_string();

        Ok(ResolvedConfig {
            base_identifier,
            entries,
        })
    }
}

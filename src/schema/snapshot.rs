//! Immutable point-in-time view of the backend schema.
//!
//! # Responsibilities
//! - Index tables by display name and internal name (lowercased)
//! - Index scalar and relationship fields per table
//! - Answer lookups without locking (the snapshot is never mutated)

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::schema::SchemaLookup;

/// Column type discriminators the backend uses for link fields.
const RELATIONSHIP_TYPES: [&str; 2] = ["Links", "LinkToAnotherRecord"];

/// Kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Scalar,
    Relationship,
}

impl FieldKind {
    /// Classify a backend column type discriminator.
    pub fn from_backend_type(kind: &str) -> Self {
        if RELATIONSHIP_TYPES.contains(&kind) {
            Self::Relationship
        } else {
            Self::Scalar
        }
    }
}

/// A single field of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
        }
    }
}

/// A table as reported by the metadata API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    pub id: String,
    pub display_name: String,
    pub internal_name: String,
    pub fields: Vec<FieldDescriptor>,
}

/// Immutable schema snapshot.
///
/// Built once by [`SnapshotBuilder`] and shared via `Arc`; a refresh always
/// produces a new snapshot instead of editing this one.
#[derive(Debug, Clone)]
pub struct SchemaSnapshot {
    base_id: String,
    /// lowercase display/internal name -> table id
    tables: HashMap<String, String>,
    /// table id -> (lowercase field name -> field id)
    fields_by_table: HashMap<String, HashMap<String, String>>,
    /// table id -> (lowercase link field name -> field id)
    relationship_fields_by_table: HashMap<String, HashMap<String, String>>,
    descriptors: Vec<TableDescriptor>,
    loaded_at: SystemTime,
}

impl SchemaSnapshot {
    /// Base the snapshot was loaded from.
    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    pub fn loaded_at(&self) -> SystemTime {
        self.loaded_at
    }

    /// Time elapsed since the snapshot was built.
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.loaded_at)
            .unwrap_or_default()
    }

    /// Number of distinct tables.
    pub fn table_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Number of tables with at least one relationship field.
    pub fn relationship_table_count(&self) -> usize {
        self.relationship_fields_by_table.len()
    }

    /// Tables in the order the metadata API listed them.
    pub fn tables(&self) -> &[TableDescriptor] {
        &self.descriptors
    }

    pub fn table_id(&self, name: &str) -> Option<&str> {
        self.tables.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn field_id(&self, table_id: &str, name: &str) -> Option<&str> {
        self.fields_by_table
            .get(table_id)?
            .get(&name.to_lowercase())
            .map(String::as_str)
    }

    pub fn relationship_field_id(&self, table_id: &str, name: &str) -> Option<&str> {
        self.relationship_fields_by_table
            .get(table_id)?
            .get(&name.to_lowercase())
            .map(String::as_str)
    }
}

impl SchemaLookup for SchemaSnapshot {
    fn resolve_table(&self, name: &str) -> Option<String> {
        self.table_id(name).map(str::to_string)
    }

    fn resolve_field(&self, table_id: &str, name: &str) -> Option<String> {
        self.field_id(table_id, name).map(str::to_string)
    }

    fn resolve_relationship_field(&self, table_id: &str, name: &str) -> Option<String> {
        self.relationship_field_id(table_id, name).map(str::to_string)
    }
}

/// Private working copy used to assemble a snapshot off to the side.
#[derive(Debug)]
pub struct SnapshotBuilder {
    base_id: String,
    tables: HashMap<String, String>,
    fields_by_table: HashMap<String, HashMap<String, String>>,
    relationship_fields_by_table: HashMap<String, HashMap<String, String>>,
    descriptors: Vec<TableDescriptor>,
}

impl SnapshotBuilder {
    pub fn new(base_id: impl Into<String>) -> Self {
        Self {
            base_id: base_id.into(),
            tables: HashMap::new(),
            fields_by_table: HashMap::new(),
            relationship_fields_by_table: HashMap::new(),
            descriptors: Vec::new(),
        }
    }

    /// Register a table and its scalar fields.
    ///
    /// The first table to claim a lowercase name keeps it; later claimants
    /// are logged and skipped for that name. This differs from a plain map
    /// overwrite, where the last table listed would win: listing order is
    /// not stable across backend responses, so a refresh must not silently
    /// remap a name that already resolves.
    pub fn add_table(&mut self, table: TableDescriptor) -> &mut Self {
        let names = [table.display_name.as_str(), table.internal_name.as_str()];
        for name in names {
            if name.is_empty() {
                continue;
            }
            self.index_table_name(name, &table.id);
        }

        let fields: HashMap<String, String> = table
            .fields
            .iter()
            .filter(|f| !f.name.is_empty())
            .map(|f| (f.name.to_lowercase(), f.id.clone()))
            .collect();
        if !fields.is_empty() {
            self.fields_by_table.insert(table.id.clone(), fields);
        }

        tracing::debug!(
            table_id = %table.id,
            display_name = %table.display_name,
            internal_name = %table.internal_name,
            fields = table.fields.len(),
            "Mapped table"
        );
        self.descriptors.push(table);
        self
    }

    /// Register the relationship fields discovered for one table.
    pub fn add_relationship_fields<I>(&mut self, table_id: &str, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        let mut links = HashMap::new();
        let descriptor = self.descriptors.iter_mut().find(|t| t.id == table_id);
        let mut discovered = Vec::new();

        for field in fields {
            if field.name.is_empty() {
                continue;
            }
            links.insert(field.name.to_lowercase(), field.id.clone());
            discovered.push(field);
        }

        if let Some(descriptor) = descriptor {
            for field in discovered {
                match descriptor.fields.iter_mut().find(|f| f.id == field.id) {
                    Some(existing) => existing.kind = FieldKind::Relationship,
                    None => descriptor.fields.push(FieldDescriptor {
                        kind: FieldKind::Relationship,
                        ..field
                    }),
                }
            }
        }

        if !links.is_empty() {
            tracing::debug!(table_id = %table_id, count = links.len(), "Cached link fields");
            self.relationship_fields_by_table
                .insert(table_id.to_string(), links);
        }
        self
    }

    pub fn build(self) -> SchemaSnapshot {
        SchemaSnapshot {
            base_id: self.base_id,
            tables: self.tables,
            fields_by_table: self.fields_by_table,
            relationship_fields_by_table: self.relationship_fields_by_table,
            descriptors: self.descriptors,
            loaded_at: SystemTime::now(),
        }
    }

    fn index_table_name(&mut self, name: &str, table_id: &str) {
        let key = name.to_lowercase();
        match self.tables.get(&key) {
            Some(existing) if existing != table_id => {
                tracing::warn!(
                    name = %name,
                    kept = %existing,
                    skipped = %table_id,
                    "Table name claimed by two tables, keeping the first"
                );
            }
            Some(_) => {}
            None => {
                self.tables.insert(key, table_id.to_string());
            }
        }
    }
}

//! Declarative resource allow-list.
//!
//! ```toml
//! base_id = "p_abc"   # optional
//!
//! [[resources]]
//! key = "products"
//! table = "Products"
//! operations = ["read", "create", "link"]
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::routing::Operation;

/// Logical resources and the operations they permit. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StaticResourceConfig {
    /// Overrides the upstream base identifier for resolved requests.
    #[serde(default)]
    pub base_id: Option<String>,

    /// Entries in declaration order.
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

/// One logical resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceEntry {
    /// Client-facing key (first path segment).
    pub key: String,

    /// Backend table display name or internal name.
    pub table: String,

    #[serde(default)]
    pub operations: BTreeSet<Operation>,
}

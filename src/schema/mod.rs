//! Live backend schema subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     client.rs (list tables, then per-table detail)
//!     → snapshot.rs (SnapshotBuilder assembles an immutable SchemaSnapshot)
//!     → cache.rs (first snapshot published; failure is fatal)
//!
//! Every refresh interval:
//!     client.rs fetch → new snapshot built off to the side
//!     → atomic pointer swap in SchemaCache
//!     → on failure: log, keep serving the previous snapshot
//!
//! Per request:
//!     routing → SchemaLookup (name → identifier, case-insensitive)
//! ```
//!
//! # Design Decisions
//! - Snapshots are never mutated once published; a refresh replaces the whole `Arc`
//! - Readers never wait on network I/O, only on an `ArcSwap` load
//! - A failed detail fetch for one table degrades that table only

use std::sync::Arc;

use arc_swap::ArcSwapOption;

pub mod cache;
pub mod client;
pub mod snapshot;
pub mod types;

pub use cache::{SchemaCache, SchemaStats};
pub use client::MetadataClient;
pub use snapshot::{FieldDescriptor, FieldKind, SchemaSnapshot, SnapshotBuilder, TableDescriptor};
pub use types::{SchemaLoadError, SchemaResult};

/// Name → identifier lookups against the backend schema.
///
/// Implemented by a single [`SchemaSnapshot`] and by [`SchemaCache`], which
/// delegates to whatever snapshot is current at call time. All names are
/// compared case-insensitively.
///
/// Every lookup on a [`SchemaCache`] may observe a different snapshot. Code
/// that chains lookups for one request pins a snapshot through
/// [`SnapshotSource`] and queries that instead.
pub trait SchemaLookup: Send + Sync {
    /// Resolve a table display name or internal name to its identifier.
    fn resolve_table(&self, name: &str) -> Option<String>;

    /// Resolve a scalar field name within one table.
    fn resolve_field(&self, table_id: &str, name: &str) -> Option<String>;

    /// Resolve a relationship (link) field name within one table.
    fn resolve_relationship_field(&self, table_id: &str, name: &str) -> Option<String>;
}

/// Hands out the current snapshot as one consistent unit.
pub trait SnapshotSource: Send + Sync {
    /// The snapshot in effect right now, or `None` before the first load.
    fn current(&self) -> Option<Arc<SchemaSnapshot>>;
}

impl SnapshotSource for ArcSwapOption<SchemaSnapshot> {
    fn current(&self) -> Option<Arc<SchemaSnapshot>> {
        self.load_full()
    }
}

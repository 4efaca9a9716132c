//! Concurrently readable cache of the current schema snapshot.
//!
//! # Responsibilities
//! - Load the first snapshot before traffic is served
//! - Refresh on a timer, keeping the old snapshot when a refresh fails
//! - Serve name lookups from whichever snapshot is current
//!
//! # Design Decisions
//! - The snapshot lives behind an `ArcSwapOption`: readers take a lock-free
//!   guard, the refresh task publishes with a single pointer store
//! - The new snapshot is fully built before the swap, so readers never see a
//!   mix of old and new mappings
//! - The refresh task listens on the shutdown broadcast and exits with it

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::observability::metrics;
use crate::schema::client::MetadataClient;
use crate::schema::snapshot::SchemaSnapshot;
use crate::schema::types::SchemaResult;
use crate::schema::{SchemaLookup, SnapshotSource};

/// Read-only summary of the cache, exposed for introspection.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SchemaStats {
    pub ready: bool,
    pub loaded_at: Option<u64>,
    pub age_secs: Option<u64>,
    pub table_count: usize,
    pub relationship_table_count: usize,
}

/// Owner of the current [`SchemaSnapshot`].
pub struct SchemaCache {
    client: MetadataClient,
    current: ArcSwapOption<SchemaSnapshot>,
}

impl SchemaCache {
    /// Create an empty cache. Nothing is fetched until [`load_initial`](Self::load_initial).
    pub fn new(client: MetadataClient) -> Self {
        Self {
            client,
            current: ArcSwapOption::empty(),
        }
    }

    /// Perform the first fetch. Callers treat an error here as fatal.
    pub async fn load_initial(&self) -> SchemaResult<Arc<SchemaSnapshot>> {
        tracing::info!(base_id = %self.client.base_id(), "Performing initial schema load");
        let snapshot = self.fetch_and_publish().await?;
        tracing::info!(
            tables = snapshot.table_count(),
            link_tables = snapshot.relationship_table_count(),
            "Initial schema load complete"
        );
        Ok(snapshot)
    }

    /// Fetch a candidate snapshot and swap it in.
    ///
    /// On failure the previous snapshot stays current and the error is
    /// returned for the caller to report.
    pub async fn refresh(&self) -> SchemaResult<Arc<SchemaSnapshot>> {
        match self.fetch_and_publish().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                metrics::record_schema_refresh("failure");
                tracing::error!(
                    error = %e,
                    stale = self.is_ready(),
                    "Schema refresh failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }

    /// Spawn the periodic refresh task.
    ///
    /// The first refresh happens one full `interval` after the call; the task
    /// exits when `shutdown` fires or its sender is dropped.
    pub fn start_background_refresh(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        let interval = interval.max(Duration::from_millis(1));

        tokio::spawn(async move {
            tracing::info!(interval = ?interval, "Schema refresh task starting");
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracing::debug!("Refreshing schema cache");
                        // Errors are already logged by refresh().
                        let _ = cache.refresh().await;
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Schema refresh task received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        })
    }

    /// True once at least one snapshot has been published.
    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }

    /// The current snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<SchemaSnapshot>> {
        self.current.load_full()
    }

    pub fn stats(&self) -> SchemaStats {
        match self.snapshot() {
            Some(snapshot) => SchemaStats {
                ready: true,
                loaded_at: snapshot
                    .loaded_at()
                    .duration_since(UNIX_EPOCH)
                    .ok()
                    .map(|d| d.as_secs()),
                age_secs: Some(snapshot.age().as_secs()),
                table_count: snapshot.table_count(),
                relationship_table_count: snapshot.relationship_table_count(),
            },
            None => SchemaStats::default(),
        }
    }

    async fn fetch_and_publish(&self) -> SchemaResult<Arc<SchemaSnapshot>> {
        let snapshot = Arc::new(self.client.fetch_snapshot().await?);
        self.current.store(Some(Arc::clone(&snapshot)));

        metrics::record_schema_refresh("success");
        metrics::record_schema_tables(snapshot.table_count());
        tracing::info!(
            tables = snapshot.table_count(),
            link_tables = snapshot.relationship_table_count(),
            "Schema snapshot published"
        );
        Ok(snapshot)
    }

    fn with_snapshot<R>(&self, f: impl FnOnce(&SchemaSnapshot) -> Option<R>) -> Option<R> {
        let guard = self.current.load();
        guard.as_deref().and_then(f)
    }
}

impl SnapshotSource for SchemaCache {
    fn current(&self) -> Option<Arc<SchemaSnapshot>> {
        self.snapshot()
    }
}

impl SchemaLookup for SchemaCache {
    fn resolve_table(&self, name: &str) -> Option<String> {
        self.with_snapshot(|s| s.resolve_table(name))
    }

    fn resolve_field(&self, table_id: &str, name: &str) -> Option<String> {
        self.with_snapshot(|s| s.resolve_field(table_id, name))
    }

    fn resolve_relationship_field(&self, table_id: &str, name: &str) -> Option<String> {
        let found = self.with_snapshot(|s| s.resolve_relationship_field(table_id, name));
        if found.is_none() {
            tracing::debug!(table_id = %table_id, field = %name, "Link field not found");
        }
        found
    }
}

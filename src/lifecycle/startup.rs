//! Startup orchestration.
//!
//! # Responsibilities
//! - Load the first schema snapshot (fatal on failure)
//! - Start the background schema refresh
//! - Load and resolve the resource allow-list, choosing the routing mode
//! - Optionally watch the resource file for explicit re-resolution
//!
//! # Design Decisions
//! - Fail fast on the schema: no schema-driven traffic without a snapshot
//! - Resource problems degrade to legacy mode instead of aborting
//! - Background tasks subscribe to the shared shutdown signal

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::watcher::ResourcesWatcher;
use crate::config::{load_resources, ProxyConfig, StaticResourceConfig};
use crate::lifecycle::Shutdown;
use crate::routing::{ConfigResolver, RequestRouter, ResolveError, RoutingMode};
use crate::schema::{MetadataClient, SchemaCache, SchemaLoadError, SchemaSnapshot, SnapshotSource};

/// Errors that stop the process from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("initial schema load failed: {0}")]
    Schema(#[from] SchemaLoadError),
}

/// Everything the HTTP layer needs, plus handles that must outlive startup.
pub struct Components {
    pub config: ProxyConfig,
    pub cache: Option<Arc<SchemaCache>>,
    pub router: Arc<RequestRouter>,
    pub refresh_task: Option<JoinHandle<()>>,
    /// Kept alive for as long as resource watching should continue.
    pub watcher: Option<RecommendedWatcher>,
}

/// Build the schema cache and router for `config`.
pub async fn bootstrap(config: ProxyConfig, shutdown: &Shutdown) -> Result<Components, StartupError> {
    let cache = if config.upstream.schema_enabled() {
        tracing::info!(
            meta_url = %config.upstream.metadata_url(),
            base_id = %config.upstream.base_id,
            token = %config.upstream.masked_token(),
            "Initialising schema cache"
        );
        let client = MetadataClient::new(&config.upstream, &config.schema)?;
        let cache = Arc::new(SchemaCache::new(client));
        cache.load_initial().await?;
        Some(cache)
    } else {
        tracing::warn!("upstream.base_id not set, schema cache disabled");
        None
    };

    let refresh_task = cache.as_ref().map(|cache| {
        cache.start_background_refresh(
            Duration::from_secs(config.schema.refresh_interval_secs),
            shutdown.subscribe(),
        )
    });

    let schema = cache
        .clone()
        .map(|cache| cache as Arc<dyn SnapshotSource>);
    let router = Arc::new(RequestRouter::new(schema));

    let resources_path = Path::new(&config.resources.path);
    match (read_resources(resources_path), cache.as_ref().and_then(|c| c.snapshot())) {
        (Some(resources), Some(snapshot)) => {
            if let Err(e) = resolve_and_install(&snapshot, &router, &resources) {
                tracing::error!(error = %e, "Resource configuration references unknown tables");
                tracing::warn!("Falling back to legacy mode (no operation allow-list)");
            }
        }
        (Some(_), None) => {
            tracing::warn!("Resource configuration ignored: no schema cache to resolve it against");
        }
        (None, _) => {}
    }

    let watcher = match &cache {
        Some(cache) if config.resources.watch => {
            spawn_resources_watcher(resources_path, Arc::clone(cache), Arc::clone(&router), shutdown)
        }
        _ => None,
    };

    match router.mode() {
        RoutingMode::SchemaDriven => tracing::info!(
            resources = router.resolved_config().map(|c| c.len()).unwrap_or(0),
            "Proxy mode: schema-driven, validation enabled"
        ),
        RoutingMode::Legacy => tracing::info!("Proxy mode: legacy, all operations allowed"),
    }

    Ok(Components {
        config,
        cache,
        router,
        refresh_task,
        watcher,
    })
}

/// Resolve `resources` against `snapshot` and, on success, switch `router`
/// to the result. On failure the router keeps whatever it had.
pub fn resolve_and_install(
    snapshot: &SchemaSnapshot,
    router: &RequestRouter,
    resources: &StaticResourceConfig,
) -> Result<(), ResolveError> {
    let resolved = ConfigResolver::new(snapshot).resolve(resources)?;
    router.install(resolved);
    Ok(())
}

fn read_resources(path: &Path) -> Option<StaticResourceConfig> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No resource configuration found, using legacy mode");
        return None;
    }
    match load_resources(path) {
        Ok(resources) => {
            tracing::info!(
                path = %path.display(),
                resources = resources.resources.len(),
                "Loaded resource configuration"
            );
            Some(resources)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load resource configuration, continuing in legacy mode");
            None
        }
    }
}

fn spawn_resources_watcher(
    path: &Path,
    cache: Arc<SchemaCache>,
    router: Arc<RequestRouter>,
    shutdown: &Shutdown,
) -> Option<RecommendedWatcher> {
    let (watcher, mut updates) = ResourcesWatcher::new(path);
    let handle = match watcher.run() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not watch resource configuration");
            return None;
        }
    };

    let mut stop = shutdown.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(resources) = update else { break };
                    let Some(snapshot) = cache.snapshot() else { continue };
                    match resolve_and_install(&snapshot, &router, &resources) {
                        Ok(()) => tracing::info!("Resource configuration re-resolved"),
                        Err(e) => tracing::error!(
                            error = %e,
                            mode = router.mode().as_str(),
                            "Re-resolve failed, keeping current configuration"
                        ),
                    }
                }
                _ = stop.recv() => break,
            }
        }
    });

    Some(handle)
}

//! Resource file watcher for explicit re-resolution.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_resources;
use crate::config::resources::StaticResourceConfig;

/// Monitors the resource allow-list file and emits each valid new version.
pub struct ResourcesWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<StaticResourceConfig>,
}

impl ResourcesWatcher {
    /// Create a watcher and the receiver its updates arrive on.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<StaticResourceConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = %path.display(), "Resource file change detected, reloading");
                        match load_resources(&path) {
                            Ok(resources) => {
                                let _ = tx.send(resources);
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload resources, keeping current configuration");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Resource watcher started");
        Ok(watcher)
    }
}

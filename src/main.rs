//! Schema-aware data proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ /proxy/{logical path}
//!                    │
//!                    ▼
//!             ┌──────────────┐   schema-driven   ┌──────────────────┐
//!             │RequestRouter │──────────────────▶│ RequestValidator │
//!             │ (mode swap)  │                   │ allow-list + ids │
//!             └──────┬───────┘                   └────────┬─────────┘
//!                    │ legacy                             │
//!                    ▼                                    ▼
//!             best-effort table / link ──────────▶ Forwarder ──▶ data API
//!             resolution                                  ▲
//!                                                         │
//!     SchemaCache ◀── background refresh ── metadata API  │ (same backend)
//! ```
//!
//! Startup: config → logging → metrics → initial schema load (fatal) →
//! resource resolution (failure selects legacy mode) → listener.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use schema_proxy::config::load_with_env;
use schema_proxy::lifecycle::{bootstrap, signals::wait_for_shutdown_signal};
use schema_proxy::observability::{logging, metrics};
use schema_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "schema-proxy", version, about = "Schema-aware proxy for a NocoDB-style data API")]
struct Args {
    /// Path to the proxy configuration file. Missing means defaults plus environment.
    #[arg(short, long, default_value = "config/proxy.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_with_env(Some(args.config.as_path()))?;

    logging::init_logging(&config.observability);
    tracing::info!("schema-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        data_url = %config.upstream.data_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let components = match bootstrap(config, &shutdown).await {
        Ok(components) => components,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    let listener = TcpListener::bind(&components.config.listener.bind_address).await?;
    let server = HttpServer::new(&components)?;

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        trigger.trigger();
    });

    server.run(listener, shutdown.signalled()).await?;

    if let Some(task) = components.refresh_task {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Schema refresh task ended abnormally");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

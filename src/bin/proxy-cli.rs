use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use schema_proxy::admin::{SCHEMA_PATH, STATUS_PATH};
use schema_proxy::config::{load_resources, load_with_env};
use schema_proxy::observability::logging;
use schema_proxy::routing::ConfigResolver;
use schema_proxy::schema::MetadataClient;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Operator CLI for the schema-aware proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show routing mode and schema cache state
    Status,
    /// Show resolved resources and the cached schema
    Schema,
    /// Resolve a resource file against the live backend schema
    Check {
        /// Proxy configuration file
        #[arg(short, long, default_value = "config/proxy.toml")]
        config: PathBuf,

        /// Resource file; defaults to the one named in the configuration
        #[arg(short, long)]
        resources: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => fetch(&cli.url, STATUS_PATH).await,
        Commands::Schema => fetch(&cli.url, SCHEMA_PATH).await,
        Commands::Check { config, resources } => check(config, resources).await,
    }
}

async fn fetch(base_url: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), path);
    let res = reqwest::get(&url).await?;

    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(format!("{} returned status {}: {}", url, status, text).into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn check(
    config_path: PathBuf,
    resources_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_with_env(Some(config_path.as_path()))?;
    logging::init_logging(&config.observability);
    if !config.upstream.schema_enabled() {
        return Err("upstream.base_id is not set; nothing to resolve against".into());
    }

    let resources_path = resources_path.unwrap_or_else(|| PathBuf::from(&config.resources.path));
    let resources = load_resources(&resources_path)?;

    let client = MetadataClient::new(&config.upstream, &config.schema)?;
    let snapshot = client.fetch_snapshot().await?;
    eprintln!(
        "Fetched schema for base '{}': {} tables, {} with link fields",
        snapshot.base_id(),
        snapshot.table_count(),
        snapshot.relationship_table_count()
    );

    let resolved = ConfigResolver::new(&snapshot).resolve(&resources)?;
    println!("{}", serde_json::to_string_pretty(&resolved)?);
    Ok(())
}

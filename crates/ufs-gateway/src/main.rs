//! UFS Gateway - upload/download gateway for named file stores

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ufs_gateway::{run_server_with_shutdown, GatewayConfig};
use ufs_store::{DiskStore, MemoryStore, StoreRegistry};

#[derive(Parser, Debug)]
#[command(name = "ufs-gateway")]
#[command(about = "HTTP upload/download gateway for named file stores")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "UFS_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to (overrides the configuration)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on (overrides the configuration)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path prefix owned by the gateway
    #[arg(long)]
    stores_path: Option<String>,

    /// Temp directory for uploads in progress
    #[arg(long)]
    tmp_dir: Option<PathBuf>,

    /// Disk store as `name=directory`; repeatable. Without any, a single
    /// in-memory store named `default` is served.
    #[arg(long = "store", value_parser = parse_store_arg)]
    stores: Vec<(String, PathBuf)>,

    /// Enable debug logging
    #[arg(short, long, env = "UFS_DEBUG")]
    debug: bool,
}

fn parse_store_arg(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, dir)) if !name.is_empty() && !dir.is_empty() => {
            Ok((name.to_string(), PathBuf::from(dir)))
        }
        _ => Err(format!("expected name=directory, got `{}`", value)),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ufs_gateway={0},ufs_store={0},tower_http=info", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = GatewayConfig::load(args.config.as_deref())
        .context("cannot load gateway configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(stores_path) = args.stores_path {
        config.stores_path = stores_path;
    }
    if let Some(tmp_dir) = args.tmp_dir {
        config.tmp_dir = tmp_dir;
    }

    let mut stores = StoreRegistry::new();
    for (name, dir) in args.stores {
        let store = DiskStore::open(name.clone(), &dir)
            .await
            .with_context(|| format!("cannot open store `{}` at {}", name, dir.display()))?;
        tracing::info!(store = %name, root = %dir.display(), "Disk store opened");
        stores.register(Arc::new(store));
    }
    if stores.is_empty() {
        tracing::warn!("No store configured, serving in-memory store `default`; data will NOT persist");
        stores.register(Arc::new(MemoryStore::new("default")));
    }

    tracing::info!("Starting UFS gateway on {}", config.bind_addr());

    run_server_with_shutdown(config, stores, shutdown_signal()).await
}

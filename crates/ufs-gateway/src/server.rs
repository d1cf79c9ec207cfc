//! Server startup and lifecycle

use crate::{routes, AppState, GatewayConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use ufs_store::StoreRegistry;

/// Run the gateway server
pub async fn run_server(config: GatewayConfig, stores: StoreRegistry) -> anyhow::Result<()> {
    run_server_with_shutdown(config, stores, std::future::pending()).await
}

/// Run server with graceful shutdown
pub async fn run_server_with_shutdown(
    config: GatewayConfig,
    stores: StoreRegistry,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, config, stores, shutdown_signal).await
}

/// Serve on an already bound listener
pub async fn serve(
    listener: TcpListener,
    config: GatewayConfig,
    stores: StoreRegistry,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config, stores));
    state.temp.prepare().await;

    let app = routes::create_router(Arc::clone(&state));

    info!(
        addr = %listener.local_addr()?,
        prefix = %state.prefix,
        "UFS gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Gateway shutdown complete");

    Ok(())
}

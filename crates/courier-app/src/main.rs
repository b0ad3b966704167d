use std::sync::Arc;

use courier_app::app::router;
use courier_core::config::load_config;
use courier_service::gateway::{DownloadGateway, GatewayConfig};
use courier_service::proxy::TracingObserver;
use salvo::Listener;
use salvo::conn::TcpListener;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting courier download gateway"
    );

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping info");
    }

    tokio::fs::create_dir_all(&config.download.dir).await?;
    let mut gateway_config = GatewayConfig::from_settings(&config)?;
    gateway_config.download_root = tokio::fs::canonicalize(&config.download.dir).await?;
    tracing::info!(dir = %gateway_config.download_root.display(), "Serving local files");

    if config.download.is_open_mode() {
        tracing::warn!(
            "No sign key configured: plain download links are served without signature checks"
        );
    }

    let gateway = DownloadGateway::new(gateway_config, Arc::new(TracingObserver))?;

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor)
        .serve(router(Arc::new(gateway)))
        .await;

    Ok(())
}

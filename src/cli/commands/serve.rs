use anyhow::Context;

use crate::app::{router, AppState};
use crate::config::AppConfig;

pub async fn handle(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(host) = host {
        config.api.host = host;
    }
    if let Some(port) = port {
        config.api.port = port;
    }

    tracing::info!(
        "Starting Todo API in {:?} mode (table {}, bucket {})",
        config.environment,
        config.store.table_name,
        config.attachments.bucket
    );

    let state = AppState::from_config(&config).await?;
    let app = router(state, &config.api.cors_origins);

    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Todo API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

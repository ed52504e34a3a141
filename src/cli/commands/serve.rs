use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::app::{app, AppState};
use crate::auth::{PgCredentialStore, TokenService};
use crate::cli::utils::connect;

pub async fn handle() -> anyhow::Result<()> {
    let (config, database) = connect().await?;
    info!("Starting school admin API in {:?} mode", config.environment);

    if config.database.run_migrations {
        database.migrate().await?;
    }

    let store = PgCredentialStore::new(database.pool().clone());
    let tokens = TokenService::new(
        &config.security.jwt_secret,
        config.security.jwt_expiry_hours,
        Arc::new(store),
    );

    let bind_addr = config.bind_address();
    let state = AppState::new(config, database.clone(), tokens);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;
    info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

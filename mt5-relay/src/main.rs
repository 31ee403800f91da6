use anyhow::{Context, Result};
use mt5_relay::bootstrap;

#[tokio::main]
async fn main() -> Result<()> {
    // Bootstrap the application (config, logging, session, transports)
    let app = bootstrap::setup()?;

    let rpc_handle = match &app.rpc_server {
        Some(server) => Some(server.start(&app.rpc_endpoint).await?),
        None => None,
    };

    match app.router {
        Some(router) => {
            let listener = tokio::net::TcpListener::bind(&app.http_address)
                .await
                .context(format!("Failed to bind to {}", app.http_address))?;
            tracing::info!("HTTP server listening on http://{}", app.http_address);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        None => shutdown_signal().await,
    }

    tracing::info!("Shutting down...");
    if let Some(server) = &app.rpc_server {
        server.shutdown();
    }
    if let Some(handle) = rpc_handle {
        if let Err(e) = handle.await {
            tracing::error!("RPC server task failed: {}", e);
        }
    }

    let session = app.session.clone();
    tokio::task::spawn_blocking(move || session.close()).await?;
    tracing::info!("Terminal session closed");

    drop(app.log_guard);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

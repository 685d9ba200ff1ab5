use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum_server::Handle;
use pass_download_service::config::Config;
use pass_download_service::metric;

use crate::endpoints;
use crate::service::RequestService;

/// Time given to in-flight requests to complete after a shutdown signal.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Stops accepting connections on ctrl-c, and waits for in-flight requests to complete.
async fn shutdown_on_ctrl_c(handle: Handle) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            error = &error as &dyn std::error::Error,
            "failed to listen for the shutdown signal"
        );
        return;
    }
    tracing::info!("Shutting down");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}

/// Starts the services and the HTTP server based on the loaded config.
pub fn run(config: Config) -> Result<()> {
    // Log this metric before actually starting the server. This allows to see restarts even if
    // service creation fails.
    metric!(counter("server.starting") += 1);

    let web_pool = tokio::runtime::Builder::new_multi_thread()
        .thread_name("pass-download-web")
        .enable_all()
        .build()?;

    let socket = config
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid bind address `{}`", config.bind))?;
    let service = RequestService::create(config).context("failed to create HTTP service state")?;

    let handle = Handle::new();
    web_pool.spawn(shutdown_on_ctrl_c(handle.clone()));

    tracing::info!("Starting HTTP server on {}", socket);
    web_pool.block_on(
        axum_server::bind(socket)
            .handle(handle)
            .serve(endpoints::create_app(service).into_make_service()),
    )?;
    tracing::info!("System shutdown complete");

    Ok(())
}

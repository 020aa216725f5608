//! Server Loop
//!
//! Binds the listen address and serves the router until the shutdown future
//! resolves. In-flight streams are allowed to finish before `serve` returns.

use std::future::Future;

use anyhow::{Context, Result};
use relay_core::RelayConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::{router, ProxyState};

/// Bind `config.listen_addr` and serve until `shutdown` resolves
///
/// # Errors
///
/// Returns an error if the upstream client cannot be built, the address
/// cannot be bound, or the server fails.
pub async fn serve<F>(config: &RelayConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = ProxyState::from_config(config).context("Failed to build upstream client")?;
    let listener = TcpListener::bind(config.listen_addr.as_str())
        .await
        .with_context(|| format!("Failed to listen on {}", config.listen_addr))?;

    serve_listener(listener, state, shutdown).await
}

/// Serve on an already-bound listener until `shutdown` resolves
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve_listener<F>(listener: TcpListener, state: ProxyState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(
        addr = %addr,
        upstream = %state.upstream.base_url(),
        "Proxy listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Proxy server failed")?;

    info!("Proxy stopped");
    Ok(())
}

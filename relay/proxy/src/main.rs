//! Relay Proxy - Pass-through HTTP forwarder for relay-chat
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (listen on 127.0.0.1:3000, upstream http://localhost:8000)
//! relay-proxy
//!
//! # Custom upstream
//! API_URL=https://chat-backend.example.com relay-proxy
//!
//! # Custom listen address and config file
//! relay-proxy --listen 0.0.0.0:8080 --config /etc/relay-chat/relay.toml
//!
//! # Verbose logging
//! RUST_LOG=debug relay-proxy
//! ```
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: Graceful shutdown (in-flight streams finish first)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use relay_core::{load_config, load_config_from_path, ConfigOverrides};
use tracing::{error, info, warn};

/// Relay Proxy - forwards relay-chat requests to the chat backend
#[derive(Parser, Debug)]
#[command(name = "relay-proxy")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to listen on (e.g. 127.0.0.1:3000)
    #[arg(long, env = "RELAY_LISTEN", value_name = "ADDR")]
    listen: Option<String>,

    /// Upstream backend base address
    #[arg(short = 'u', long, env = "API_URL", value_name = "URL")]
    upstream: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "RELAY_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "RELAY_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "relay_proxy={level},relay_core={level},tower_http={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();
}

/// Resolve once SIGINT or SIGTERM arrives
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => info!("Received SIGINT, initiating shutdown"),
        () = terminate => info!("Received SIGTERM, initiating shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!("relay-proxy starting");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match args.config {
        Some(path) => load_config_from_path(Some(path)),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    ConfigOverrides {
        listen_addr: args.listen,
        upstream_url: args.upstream,
        ..Default::default()
    }
    .apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        listen = %config.listen_addr,
        upstream = %config.upstream_url,
        timeout_secs = config.request_timeout.as_secs(),
        source = %config.source(),
        "Configuration resolved"
    );

    match relay_proxy::serve(&config, shutdown_signal()).await {
        Ok(()) => {
            info!("relay-proxy stopped cleanly");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "relay-proxy stopped with error");
            Err(e)
        }
    }
}

//! alert-relay — entry point.
//!
//! Startup sequence:
//! 1. Parse CLI flags, initialize tracing
//! 2. Load config (file + env overrides)
//! 3. Build the channel registry + dispatch manager
//! 4. Serve the inbound webhook until Ctrl+C

mod routes;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use relay_channels::{Manager, Registry, SendMode};
use relay_core::config::{load_config, Config};

/// Alert relay — fans inbound alerts out to configured notification channels
#[derive(Parser)]
#[command(name = "alert-relay", version, about, long_about = None)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, default_value_t = false)]
    logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logs);

    let config = load_config(cli.config.as_deref());
    let manager = Arc::new(build_manager(&config));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid listen address")?;

    let state = Arc::new(routes::AppState {
        manager,
        dispatch_timeout: Duration::from_secs(config.relay.dispatch_timeout_secs),
    });
    let app = routes::router(state);

    info!(addr = %addr, "starting webhook server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

/// Build the dispatch manager from the loaded configuration.
///
/// Registry construction errors are logged per entry and the offending
/// channels skipped; the process keeps serving with whatever remains.
fn build_manager(config: &Config) -> Manager {
    let providers = config.relay.effective_providers();
    let (registry, _errors) = Registry::build(&providers, None);

    Manager::new(
        registry,
        config.relay.default_target.clone(),
        SendMode::parse(&config.relay.mode),
        config.relay.default_channels.clone(),
    )
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::error!("failed to install Ctrl+C handler");
        return;
    }
    info!("received Ctrl+C, shutting down");
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

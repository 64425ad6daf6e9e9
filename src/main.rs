//! Ledger gateway (v1)
//!
//! Accepts signed transaction envelopes over HTTP and submits them to a
//! consensus core, returning one classified outcome per submission.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client                 ┌──────────────────────── GATEWAY ───────────────────────┐
//!     POST /transactions ───▶│ http::submit ──▶ txsub::SubmissionSystem ──▶ CoreSink ──┼──▶ Core
//!                            │      ▲                 │ (dedupe by hash)      │        │
//!                            │      │ synced?         ▼                       ▼        │
//!     ◀── resource/problem ──│ health::CoreStateCell ◀── health::CoreMonitor (status) │
//!                            │                                                        │
//!                            │ config · observability · lifecycle · resilience        │
//!                            └────────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use ledger_gateway::config::load_or_default;
use ledger_gateway::http::GatewayServer;
use ledger_gateway::lifecycle::signals::spawn_signal_listener;
use ledger_gateway::lifecycle::Shutdown;
use ledger_gateway::observability::{logging, metrics};
use ledger_gateway::txsub::CoreSink;

#[derive(Parser)]
#[command(name = "ledger-gateway")]
#[command(about = "Transaction submission gateway for a ledger network", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    logging::init_logging(&config.observability);
    tracing::info!("ledger-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        core_url = %config.core.url,
        request_timeout_secs = config.timeouts.request_secs,
        wait_timeout_secs = config.submission.wait_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let sink = Arc::new(CoreSink::new(&config.core)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = GatewayServer::new(config, sink);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

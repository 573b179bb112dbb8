//! TCP Bridge
//!
//! Lets clients that can only open WebSockets reach arbitrary TCP services.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                      TCP BRIDGE                       │
//!                    │                                                       │
//!   WebSocket client │  ┌─────────┐    ┌──────────┐    ┌───────────┐        │
//!   ─────────────────┼─▶│   net   │───▶│   http   │───▶│ connector │────────┼──▶ TCP target
//!                    │  │listener │    │ /tcp     │    └─────┬─────┘        │
//!                    │  └─────────┘    └────┬─────┘          │              │
//!                    │                      │ upgrade        │ stream       │
//!                    │                      ▼                ▼              │
//!                    │               ┌─────────────────────────────┐        │
//!   ◀────────────────┼───────────────│  session + pump (2 tasks)   │◀───────┼───
//!                    │               └─────────────────────────────┘        │
//!                    │                                                       │
//!                    │  config · observability · lifecycle (shutdown)        │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use tcp_bridge::config::resolve_config;
use tcp_bridge::http::HttpServer;
use tcp_bridge::lifecycle::{signals, Shutdown};
use tcp_bridge::net::{listener, tls};
use tcp_bridge::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "tcp-bridge")]
#[command(about = "Relay WebSocket connections to arbitrary TCP services", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "TCP_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Listening port (overrides the file and the PORT variable).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref(), cli.port)?;

    logging::init(&config.observability)?;

    tracing::info!("tcp-bridge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        port = config.listener.port,
        tls = config.listener.tls.is_some(),
        max_sessions = ?config.listener.max_sessions,
        connect_timeout_secs = config.timeouts.connect_secs,
        buffer_size = config.bridge.buffer_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let grace = config.timeouts.shutdown_grace();
    let tls_config = config.listener.tls.clone();
    let server = HttpServer::new(config.clone(), shutdown);
    let sessions = server.sessions();

    match tls_config {
        Some(tls_config) => {
            let addr = listener::bind_address(&config.listener)?;
            let rustls = tls::load_tls_config(&tls_config).await?;
            server.run_tls(addr, rustls).await?;
        }
        None => {
            let listener = listener::bind(&config.listener).await?;
            server.run(listener).await?;
        }
    }

    if !sessions.wait_idle(grace).await {
        tracing::warn!(
            remaining = sessions.active_count(),
            "Sessions still open after shutdown grace period"
        );
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured host and port
//! - Bind the plain-TCP listener handed to axum

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Configured host is not an IP address.
    #[error("Invalid bind host: {0}")]
    Address(String),
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(#[source] std::io::Error),
}

/// Socket address the listener should bind.
pub fn bind_address(config: &ListenerConfig) -> Result<SocketAddr, ListenerError> {
    let ip: IpAddr = config
        .host
        .parse()
        .map_err(|_| ListenerError::Address(config.host.clone()))?;
    Ok(SocketAddr::new(ip, config.port))
}

/// Bind a TCP listener for the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let addr = bind_address(config)?;
    let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;

    let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;
    tracing::info!(
        address = %local_addr,
        max_sessions = ?config.max_sessions,
        "Listener bound"
    );

    Ok(listener)
}

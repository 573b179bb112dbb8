//! Outbound TCP connection establishment.
//!
//! One attempt per session, bounded by the configured connect timeout.
//! Timeout errors are distinct from other connect errors.

use std::io;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;

use crate::bridge::Target;
use crate::observability::metrics;

/// Failure to open the outbound connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("failed to connect to {target}: {source}")]
    Io {
        target: Target,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to {target}: timed out after {timeout:?}")]
    Timeout { target: Target, timeout: Duration },
}

impl ConnectError {
    pub fn target(&self) -> &Target {
        match self {
            ConnectError::Io { target, .. } | ConnectError::Timeout { target, .. } => target,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ConnectError::Timeout { .. })
    }
}

/// Opens outbound connections with a fixed timeout.
#[derive(Debug, Clone)]
pub struct Connector {
    timeout: Duration,
}

impl Connector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Connect to `target`. No retries.
    pub async fn connect(&self, target: &Target) -> Result<TcpStream, ConnectError> {
        tracing::info!(upstream = %target, "Connection request");

        let attempt = TcpStream::connect((target.dial_host(), target.port));
        match time::timeout(self.timeout, attempt).await {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    tracing::debug!(upstream = %target, error = %e, "Failed to set TCP_NODELAY");
                }
                metrics::record_connect("success");
                Ok(stream)
            }
            Ok(Err(source)) => {
                metrics::record_connect("error");
                Err(ConnectError::Io {
                    target: target.clone(),
                    source,
                })
            }
            Err(_) => {
                metrics::record_connect("timeout");
                Err(ConnectError::Timeout {
                    target: target.clone(),
                    timeout: self.timeout,
                })
            }
        }
    }
}

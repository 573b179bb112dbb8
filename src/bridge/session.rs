//! A single bridge session: one WebSocket paired with one TCP connection.

use std::net::SocketAddr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::extract::ws::WebSocket;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::bridge::pump::{self, PumpConfig, PumpSummary};
use crate::bridge::tracker::SessionGuard;
use crate::bridge::Target;
use crate::observability::metrics;

/// Owns both connections of a session for its whole lifetime.
#[derive(Debug)]
pub struct Session {
    target: Target,
    peer: SocketAddr,
    upstream: TcpStream,
    created_at: SystemTime,
    cancel: CancellationToken,
    guard: SessionGuard,
}

impl Session {
    /// `cancel` should be a child of the server shutdown token so that
    /// shutdown reaches in-flight sessions.
    pub fn new(
        target: Target,
        peer: SocketAddr,
        upstream: TcpStream,
        guard: SessionGuard,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            target,
            peer,
            upstream,
            created_at: SystemTime::now(),
            cancel,
            guard,
        }
    }

    /// Relay until either side ends. Both connections are closed on return.
    pub async fn run(self, socket: WebSocket, config: PumpConfig) -> PumpSummary {
        let span = tracing::info_span!(
            "bridge",
            session_id = %self.guard.id(),
            upstream = %self.target,
            peer = %self.peer,
            created_at_ms = unix_millis(self.created_at),
        );

        async move {
            let Session {
                upstream,
                cancel,
                guard,
                ..
            } = self;

            tracing::info!("Bridge established");
            let started = Instant::now();

            let (frames_out, frames_in) = socket.split();
            let summary = pump::run(frames_in, frames_out, upstream, cancel, &config).await;

            let elapsed = started.elapsed();
            metrics::record_session(elapsed, summary.inbound.bytes, summary.outbound.bytes);
            tracing::info!(
                duration_ms = elapsed.as_millis() as u64,
                bytes_in = summary.inbound.bytes,
                bytes_out = summary.outbound.bytes,
                ended_by = summary.ended_by().map(|d| d.as_str()).unwrap_or("shutdown"),
                inbound_exit = ?summary.inbound.exit,
                outbound_exit = ?summary.outbound.exit,
                "Connection closed"
            );

            drop(guard);
            summary
        }
        .instrument(span)
        .await
    }
}

/// Milliseconds since the Unix epoch; zero for clocks set before it.
fn unix_millis(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

//! WebSocket bridge endpoint.
//!
//! # Data Flow
//! ```text
//! GET /tcp?host=H&port=P
//!     → resolve target (400 if host/port missing)
//!     → admit session (503 if the cap is reached)
//!     → connect to H:P (502/504 on failure, no upgrade)
//!     → complete the upgrade (101)
//!     → Session::run relays until either side closes
//! ```
//!
//! The upgrade is answered only once the TCP connection is open, so a client
//! never sees a "connected" WebSocket for an unreachable target. If the
//! upgrade fails after connecting, the TCP stream is dropped with the
//! upgrade callback.

use std::net::SocketAddr;

use axum::{
    extract::{
        rejection::QueryRejection,
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        ConnectInfo, Query, State,
    },
    http::HeaderMap,
    response::{IntoResponse, Response},
};

use crate::bridge::Session;
use crate::http::request::{request_id, TargetParams};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Handler for the bridge endpoint.
pub async fn tcp_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    params: Result<Query<TargetParams>, QueryRejection>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let request_id = request_id(&headers);

    let target = match params.map(|Query(p)| p).unwrap_or_default().resolve() {
        Ok(target) => target,
        Err(e) => {
            tracing::warn!(request_id = %request_id, peer = %peer, error = %e, "Rejected bridge request");
            metrics::record_rejected("invalid_request");
            return e.into_response();
        }
    };

    let guard = match state.sessions.admit() {
        Ok(guard) => guard,
        Err(e) => {
            tracing::warn!(request_id = %request_id, upstream = %target, limit = e.limit, "Session limit reached");
            metrics::record_rejected("session_limit");
            return e.into_response();
        }
    };

    let upstream = match state.connector.connect(&target).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(request_id = %request_id, upstream = %target, error = %e, "Upstream connect failed");
            return e.into_response();
        }
    };

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            tracing::warn!(
                request_id = %request_id,
                upstream = %target,
                error = %rejection,
                "WebSocket upgrade failed"
            );
            metrics::record_rejected("handshake");
            drop(upstream);
            return rejection.into_response();
        }
    };

    tracing::debug!(request_id = %request_id, session_id = %guard.id(), upstream = %target, "Upgrading connection");

    let cancel = state.shutdown.child_token();
    let pump_config = state.pump.clone();
    let failed_target = target.clone();

    upgrade
        .read_buffer_size(pump_config.buffer_size)
        .on_failed_upgrade(move |e: axum::Error| {
            tracing::warn!(upstream = %failed_target, error = %e, "WebSocket upgrade failed");
            metrics::record_rejected("handshake");
        })
        .on_upgrade(move |socket| async move {
            let session = Session::new(target, peer, upstream, guard, cancel);
            session.run(socket, pump_config).await;
        })
}

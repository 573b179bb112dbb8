//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout)
//! - Serve on a plain listener or over TLS
//! - Stop accepting on shutdown

use std::net::SocketAddr;

use axum::{
    http::HeaderName,
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use serde::Serialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::bridge::{Connector, PumpConfig, SessionTracker};
use crate::config::BridgeConfig;
use crate::http::request::X_REQUEST_ID;
use crate::http::websocket::tcp_handler;
use crate::lifecycle::Shutdown;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub connector: Connector,
    pub sessions: SessionTracker,
    pub pump: PumpConfig,
    pub shutdown: Shutdown,
}

/// HTTP server for the bridge.
pub struct HttpServer {
    router: Router,
    config: BridgeConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: BridgeConfig, shutdown: Shutdown) -> Self {
        let state = AppState {
            connector: Connector::new(config.timeouts.connect()),
            sessions: SessionTracker::new(config.listener.max_sessions),
            pump: PumpConfig {
                buffer_size: config.bridge.buffer_size,
                close_timeout: config.timeouts.close(),
            },
            shutdown,
        };

        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BridgeConfig, state: AppState) -> Router {
        let request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/tcp", get(tcp_handler))
            .route("/health", any(health))
            .route("/", any(service_info))
            .fallback(service_info)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(request_id))
                    .layer(TimeoutLayer::new(config.timeouts.request())),
            )
    }

    /// Tracker for sessions admitted by this server.
    pub fn sessions(&self) -> SessionTracker {
        self.state.sessions.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// shutdown triggers.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "TCP bridge starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(self.state.shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on `addr` until shutdown triggers.
    pub async fn run_tls(self, addr: SocketAddr, tls: RustlsConfig) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, "TCP bridge starting (TLS)");

        let handle = axum_server::Handle::new();
        let shutdown = self.state.shutdown.clone();
        let grace = self.config.timeouts.shutdown_grace();
        let stopper = handle.clone();
        tokio::spawn(async move {
            shutdown.wait().await;
            stopper.graceful_shutdown(Some(grace));
        });

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(app)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Static description served at the root path.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub usage: &'static str,
    pub example: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

async fn service_info() -> impl IntoResponse {
    Json(ServiceInfo {
        service: "tcp-bridge",
        usage: "wss://HOST/tcp?host=TARGET&port=PORT",
        example: "wss://tcp-bridge-xxx.run.app/tcp?host=kafka.example.com&port=9092",
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, routes)
//!     → request.rs (request ID, target resolution)
//!     → websocket.rs (connect upstream, then upgrade, then hand to the bridge)
//!     → response.rs (JSON error bodies)
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::{RequestError, TargetParams, X_REQUEST_ID};
pub use server::{AppState, HttpServer};

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (plain TCP bind)  or  tls.rs (rustls via axum-server)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional; with it configured clients can dial `wss://` directly

pub mod listener;
pub mod tls;

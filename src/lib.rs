//! WebSocket to TCP bridge library.
//!
//! Accepts WebSocket upgrades on `/tcp?host=H&port=P`, opens one TCP
//! connection to `H:P`, and relays bytes both ways until either side closes.

pub mod bridge;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use bridge::{Session, Target};
pub use config::schema::BridgeConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

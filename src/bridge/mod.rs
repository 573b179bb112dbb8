//! Bridge core.
//!
//! # Data Flow
//! ```text
//! Target (from the HTTP layer)
//!     → tracker.rs (admission, session ID)
//!     → connector.rs (one TCP connect, bounded by timeout)
//!     → [WebSocket upgrade completes in the HTTP layer]
//!     → session.rs (owns both connections, logging span)
//!     → pump.rs (two relay tasks, shared cancellation, join, close)
//! ```
//!
//! # Design Decisions
//! - The upgrade is only accepted once the outbound connection is open
//! - Sessions share nothing but the optional admission semaphore
//! - Hard cutover on the first direction to end; no half-close

pub mod connector;
pub mod pump;
pub mod session;
pub mod target;
pub mod tracker;

pub use connector::{ConnectError, Connector};
pub use pump::{Direction, LoopExit, PumpConfig, PumpSummary};
pub use session::Session;
pub use target::Target;
pub use tracker::{AdmissionError, SessionGuard, SessionId, SessionTracker};

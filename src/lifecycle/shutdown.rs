//! Shutdown coordination for the bridge.

use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Coordinator for graceful shutdown.
///
/// Wraps a root cancellation token. The listener waits on it, and every
/// session runs under a child token so shutdown also ends in-flight relays.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token cancelled when shutdown triggers. Cancelling the child does
    /// not trigger shutdown.
    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once shutdown has been triggered.
    pub fn wait(&self) -> WaitForCancellationFutureOwned {
        self.token.clone().cancelled_owned()
    }
}

//! Session identity and admission control.
//!
//! # Responsibilities
//! - Generate unique session IDs for tracing
//! - Count active sessions (connect phase included)
//! - Enforce the optional `max_sessions` cap via semaphore

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

use crate::observability::metrics;

/// Unique identifier for a bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sess-{}", self.0.simple())
    }
}

/// The session cap is exhausted.
#[derive(Debug, Error)]
#[error("session limit reached")]
pub struct AdmissionError {
    pub limit: usize,
}

/// Tracks active sessions across the whole server.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    active_count: Arc<AtomicU64>,
    limit: Option<(usize, Arc<Semaphore>)>,
}

impl SessionTracker {
    /// `max_sessions` of `None` admits everything.
    pub fn new(max_sessions: Option<usize>) -> Self {
        Self {
            active_count: Arc::new(AtomicU64::new(0)),
            limit: max_sessions.map(|max| (max, Arc::new(Semaphore::new(max)))),
        }
    }

    /// Admit a new session. The returned guard holds the slot until dropped.
    pub fn admit(&self) -> Result<SessionGuard, AdmissionError> {
        let permit = match &self.limit {
            Some((limit, semaphore)) => Some(
                semaphore
                    .clone()
                    .try_acquire_owned()
                    .map_err(|_| AdmissionError { limit: *limit })?,
            ),
            None => None,
        };

        let active = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_sessions(active);

        Ok(SessionGuard {
            active_count: Arc::clone(&self.active_count),
            id: SessionId::new(),
            _permit: permit,
        })
    }

    /// Current count of admitted sessions.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until no sessions remain or `grace` elapses. Returns whether
    /// the tracker drained.
    pub async fn wait_idle(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        while self.active_count() > 0 {
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        true
    }
}

/// Guard that tracks a session's lifetime.
/// Decrements the active count and frees the admission slot when dropped.
#[derive(Debug)]
pub struct SessionGuard {
    active_count: Arc<AtomicU64>,
    id: SessionId,
    _permit: Option<OwnedSemaphorePermit>,
}

impl SessionGuard {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let remaining = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_sessions(remaining);
        tracing::trace!(session_id = %self.id, "Session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert!(SessionId::new().to_string().starts_with("sess-"));
    }

    #[test]
    fn tracker_counts() {
        let tracker = SessionTracker::new(None);
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.admit().unwrap();
        let guard2 = tracker.admit().unwrap();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);
        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn tracker_enforces_limit() {
        let tracker = SessionTracker::new(Some(1));
        let guard = tracker.admit().unwrap();

        let err = tracker.admit().unwrap_err();
        assert_eq!(err.limit, 1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard);
        assert!(tracker.admit().is_ok());
    }

    #[tokio::test]
    async fn wait_idle_reports_drain() {
        let tracker = SessionTracker::new(None);
        assert!(tracker.wait_idle(Duration::from_millis(10)).await);

        let guard = tracker.admit().unwrap();
        assert!(!tracker.wait_idle(Duration::from_millis(100)).await);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(guard);
        });
        assert!(tracker.wait_idle(Duration::from_secs(2)).await);
    }
}

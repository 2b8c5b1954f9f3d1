//! In-flight upstream exchange tracking.
//!
//! # Responsibilities
//! - Count requests that currently hold (or are acquiring) an upstream connection
//! - Release the count when the exchange is finished or abandoned
//!
//! A guard is taken before the upstream request is sent and moved into the
//! streamed response body. Whatever ends the exchange (body complete, origin
//! error, client hang-up dropping the body) drops the guard.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Tracks in-flight upstream exchanges.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active_count: Arc<AtomicU64>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new exchange. Returns a guard that decrements on drop.
    pub fn track(&self) -> InFlightGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            active_count: Arc::clone(&self.active_count),
        }
    }

    /// Get current in-flight exchange count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until no exchange is in flight.
    pub async fn wait_until_idle(&self) {
        while self.active_count() > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// Guard that tracks an exchange's lifetime.
#[derive(Debug)]
pub struct InFlightGuard {
    active_count: Arc<AtomicU64>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
    }
}

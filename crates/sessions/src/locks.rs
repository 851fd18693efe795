//! Per-session mutual exclusion.
//!
//! Requests against the same session must not interleave between loading
//! a transcript and saving it back, or two appends could race past the
//! retention bound. Holding the guard from [`SessionLocks::acquire`] for
//! the whole load → act → save cycle serializes them; different sessions
//! proceed independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use parley_core::session::SessionId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Lock table size above which idle entries are pruned.
const PRUNE_THRESHOLD: usize = 1_024;

#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one session.
    pub async fn acquire(&self, id: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());

            if locks.len() > PRUNE_THRESHOLD {
                // Nobody else holds a handle to these, so nobody is waiting.
                locks.retain(|_, l| Arc::strong_count(l) > 1);
            }

            locks
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of sessions with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

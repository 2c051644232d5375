//! Recycling of session state across request cycles.
//!
//! A [`SessionPool`] hands out [`SessionState`] values and takes them back
//! once a cycle ends. All clearing happens in [`SessionPool::release`], so a
//! recycled state can never carry an identifier, freshness flag or record
//! entry from a previous cycle.
//!
//! The pool is bounded: releases beyond `capacity` idle objects are dropped
//! instead of retained.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::record::Record;

/// Per-cycle session state: identifier, freshness and record.
#[derive(Debug)]
pub struct SessionState {
    pub(crate) id: String,
    pub(crate) fresh: bool,
    pub(crate) record: Record,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            id: String::new(),
            fresh: true,
            record: Record::new(),
        }
    }
}

impl SessionState {
    /// Current identifier; empty while pooled.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Whether this state is indistinguishable from a newly built one.
    pub fn is_pristine(&self) -> bool {
        self.id.is_empty() && self.fresh && self.record.is_empty()
    }
}

/// Thread-safe, bounded pool of [`SessionState`] values.
#[derive(Debug)]
pub struct SessionPool {
    idle: Mutex<Vec<SessionState>>,
    capacity: usize,
    created: AtomicU64,
    reused: AtomicU64,
}

impl SessionPool {
    /// Create a pool retaining at most `capacity` idle states.
    pub fn new(capacity: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            capacity,
            created: AtomicU64::new(0),
            reused: AtomicU64::new(0),
        }
    }

    /// Take a pristine state, recycled when one is idle.
    pub fn acquire(&self) -> SessionState {
        if let Some(state) = self.idle.lock().pop() {
            self.reused.fetch_add(1, Ordering::Relaxed);
            return state;
        }
        self.created.fetch_add(1, Ordering::Relaxed);
        SessionState::default()
    }

    /// Clear `state` and keep it for a later [`acquire`](Self::acquire).
    ///
    /// Each acquired state must be released at most once. The
    /// [`Session`](crate::Session) guard guarantees this by releasing only
    /// on drop.
    pub fn release(&self, mut state: SessionState) {
        state.id.clear();
        state.fresh = true;
        state.record.reset();

        let mut idle = self.idle.lock();
        if idle.len() < self.capacity {
            idle.push(state);
        } else {
            trace!(capacity = self.capacity, "Session pool full, dropping state");
        }
    }

    /// Get pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            idle: self.idle.lock().len(),
            capacity: self.capacity,
            created: self.created.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
        }
    }
}

/// Pool statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// States currently waiting for reuse.
    pub idle: usize,

    /// Maximum idle states retained.
    pub capacity: usize,

    /// States built because none were idle.
    pub created: u64,

    /// Acquisitions served from idle states.
    pub reused: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_is_pristine() {
        let pool = SessionPool::new(4);
        let state = pool.acquire();

        assert!(state.is_pristine());
        assert_eq!(pool.stats().created, 1);
    }

    #[test]
    fn test_release_clears_everything() {
        let pool = SessionPool::new(4);

        let mut state = pool.acquire();
        state.id = "session-1".to_string();
        state.fresh = false;
        state.record.set("user", "alice");
        pool.release(state);

        let state = pool.acquire();
        assert!(state.is_pristine());
        assert_eq!(state.record().len(), 0);

        let stats = pool.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 1);
    }

    #[test]
    fn test_capacity_bounds_idle() {
        let pool = SessionPool::new(2);
        let states: Vec<_> = (0..5).map(|_| pool.acquire()).collect();
        for state in states {
            pool.release(state);
        }

        assert_eq!(pool.stats().idle, 2);
    }

    #[test]
    fn test_zero_capacity_never_retains() {
        let pool = SessionPool::new(0);
        let state = pool.acquire();
        pool.release(state);

        assert_eq!(pool.stats().idle, 0);
        let _ = pool.acquire();
        assert_eq!(pool.stats().created, 2);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        let pool = Arc::new(SessionPool::new(16));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for i in 0..200 {
                        let mut state = pool.acquire();
                        assert!(state.is_pristine());
                        state.id = format!("session-{t}-{i}");
                        state.fresh = false;
                        state.record.set("n", i);
                        pool.release(state);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = pool.stats();
        assert_eq!(stats.created + stats.reused, 1600);
        assert!(stats.idle <= 16);
    }
}

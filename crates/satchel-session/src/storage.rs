//! Storage backends for serialized session records.
//!
//! This module defines the [`Storage`] trait that decouples the session
//! engine from where session bytes live. The engine writes exactly one blob
//! per session identifier: the serialized [`Record`](crate::Record).
//!
//! ```text
//! Storage (trait)
//!     └── MemoryStorage   - In-process map with lazy TTL expiry
//!     └── FileStorage     - One file per session in a directory
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::BackendError;

/// Result type for storage backend calls.
pub type StorageResult<T> = std::result::Result<T, BackendError>;

/// Trait for session storage backends.
///
/// Calls may block on I/O. The engine imposes no timeout; implementations
/// that need one should enforce it themselves and report a [`BackendError`].
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; one backend is shared by every
/// session handed out by a [`Store`](crate::Store).
pub trait Storage: Send + Sync {
    /// Fetch the bytes stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent or expired.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// A zero `ttl` means the entry never expires.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StorageResult<()>;

    /// Remove `key`.
    ///
    /// Deleting a missing key must succeed so that identifier rotation can
    /// be retried after a partial failure.
    fn delete(&self, key: &str) -> StorageResult<()>;
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StorageResult<()> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        (**self).delete(key)
    }
}

/// Entry held by [`MemoryStorage`].
#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Vec<u8>,

    /// `None` means no expiry.
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Entry count at which [`Storage::set`] sweeps expired entries first.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 4096;

/// In-process storage backend with per-key expiry.
///
/// Expired entries are invisible to [`Storage::get`] immediately. They are
/// reclaimed on overwrite, on delete, by [`MemoryStorage::cleanup_expired`],
/// and by a sweep that [`Storage::set`] runs once the map reaches the sweep
/// threshold. After each sweep the next one waits until the surviving entry
/// count has doubled, so writes stay amortized O(1).
#[derive(Debug)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, MemoryEntry>>,
    sweep_threshold: usize,
    next_sweep: AtomicUsize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }
}

impl MemoryStorage {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend that sweeps once `threshold` entries are held.
    pub fn with_sweep_threshold(threshold: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            sweep_threshold: threshold,
            next_sweep: AtomicUsize::new(threshold),
        }
    }

    fn sweep(entries: &mut HashMap<String, MemoryEntry>) -> usize {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Check whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .is_some_and(|e| !e.is_expired(now))
    }

    /// Remove all expired entries and return how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let count = Self::sweep(&mut self.entries.write());

        if count > 0 {
            trace!(count = count, "Cleaned up expired session entries");
        }

        count
    }

    /// Remove everything.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let now = Instant::now();
        let entries = self.entries.read();
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StorageResult<()> {
        // Overflowing the clock means no expiry
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Instant::now().checked_add(ttl)
        };

        let mut entries = self.entries.write();
        if entries.len() >= self.next_sweep.load(Ordering::Relaxed) {
            let count = Self::sweep(&mut entries);
            let next = self.sweep_threshold.max(entries.len().saturating_mul(2));
            self.next_sweep.store(next, Ordering::Relaxed);
            trace!(count = count, next = next, "Swept expired session entries");
        }
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

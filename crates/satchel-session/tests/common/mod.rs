//! Shared test doubles for session lifecycle tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use satchel_session::{
    BackendError, MemoryStorage, SessionConfig, Storage, StorageResult, Store,
};

/// Storage wrapper that counts calls and can be told to fail.
#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub deletes: AtomicUsize,
    fail_get: AtomicBool,
    fail_set: AtomicBool,
    fail_delete: AtomicBool,
}

impl FlakyStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }
}

impl Storage for FlakyStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(BackendError::other("injected get failure"));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StorageResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(BackendError::other("injected set failure"));
        }
        self.inner.set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(BackendError::other("injected delete failure"));
        }
        self.inner.delete(key)
    }
}

/// A store over a fresh [`FlakyStorage`], returning both.
pub fn flaky_store(config: SessionConfig) -> (Arc<FlakyStorage>, Store) {
    let storage = FlakyStorage::new();
    let store = Store::from_shared(config, storage.clone());
    (storage, store)
}

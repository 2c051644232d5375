//! The per-cycle session handle and its lifecycle operations.
//!
//! A [`Session`] is acquired from a [`Store`], used for one request cycle
//! and then released back to the store's pool. Release happens exactly once,
//! when the handle is dropped:
//!
//! ```text
//! Store::get ──► active ──┬── save      ──► released (success)
//!                  ▲  │   ├── destroy   ──► released on drop
//!                  └──┘   └── drop      ──► released
//!               regenerate
//! ```
//!
//! A failed [`Session::save`] hands the still-active session back inside a
//! [`SaveError`] so the caller can retry.

use std::fmt;
use std::mem;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cookie::TokenTransport;
use crate::error::{Result, SaveError};
use crate::pool::SessionState;
use crate::record::Record;
use crate::store::Store;

/// An active session bound to one request cycle.
pub struct Session<'s> {
    store: &'s Store,
    pub(crate) state: SessionState,
}

impl<'s> Session<'s> {
    pub(crate) fn new(store: &'s Store, state: SessionState) -> Self {
        Self { store, state }
    }

    /// Whether no stored data backs the current identifier.
    ///
    /// True for newly created sessions and after [`regenerate`](Self::regenerate);
    /// false once data was loaded from storage or a destroy was committed.
    pub fn fresh(&self) -> bool {
        self.state.fresh
    }

    /// The session identifier. Stable until [`regenerate`](Self::regenerate).
    pub fn id(&self) -> &str {
        &self.state.id
    }

    /// The store this session belongs to.
    pub fn store(&self) -> &'s Store {
        self.store
    }

    /// Read-only view of the session data.
    pub fn record(&self) -> &Record {
        &self.state.record
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.record.get(key)
    }

    /// Get the value under `key` decoded as `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.state.record.get_as(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.state.record.set(key, value);
    }

    /// Encode `value` and store it under `key`.
    pub fn set_serialized<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        self.state.record.set_serialized(key, value)
    }

    pub fn delete(&mut self, key: &str) {
        self.state.record.delete(key);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.state.record.keys()
    }

    pub fn len(&self) -> usize {
        self.state.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.record.is_empty()
    }

    /// Erase the session locally, in storage and on the client.
    ///
    /// The local record is cleared first and stays cleared even if the
    /// backend delete fails. In that case no revocation is emitted and the
    /// stored state is indeterminate; retry or surface the error.
    pub fn destroy(&mut self, transport: &mut (impl TokenTransport + ?Sized)) -> Result<()> {
        self.state.record.reset();

        if let Err(e) = self.store.storage().delete(&self.state.id) {
            warn!(session_id = %self.state.id, error = %e, "Failed to destroy session");
            return Err(e.into());
        }

        let cookie_name = &self.store.config().cookie.name;
        transport.strip_token(cookie_name);
        transport.set_token(self.store.revoke_directive());
        self.state.fresh = false;

        debug!(session_id = %self.state.id, "Session destroyed");
        Ok(())
    }

    /// Rotate the identifier, deleting data stored under the old one.
    ///
    /// The record is kept. If the backend delete fails the identifier is
    /// left unchanged, so the call can simply be retried.
    pub fn regenerate(&mut self) -> Result<()> {
        if let Err(e) = self.store.storage().delete(&self.state.id) {
            warn!(session_id = %self.state.id, error = %e, "Failed to regenerate session");
            return Err(e.into());
        }

        let old_id = mem::replace(&mut self.state.id, self.store.generate_id());
        self.state.fresh = true;

        debug!(old_id = %old_id, session_id = %self.state.id, "Session identifier regenerated");
        Ok(())
    }

    /// Persist the record, issue the session cookie and release the session.
    ///
    /// An empty record is not written and no cookie is issued. On failure
    /// nothing is issued and the session is returned inside the error.
    pub fn save(
        self,
        transport: &mut (impl TokenTransport + ?Sized),
    ) -> std::result::Result<(), SaveError<'s>> {
        if self.state.record.is_empty() {
            return Ok(());
        }

        let bytes = match self.state.record.serialize() {
            Ok(bytes) => bytes,
            Err(e) => return Err(SaveError::new(self, e)),
        };

        let store = self.store;
        if let Err(e) = store.storage().set(&self.state.id, &bytes, store.expiration()) {
            warn!(session_id = %self.state.id, error = %e, "Failed to save session");
            return Err(SaveError::new(self, e.into()));
        }

        transport.set_token(store.issue_directive(&self.state.id));

        debug!(
            session_id = %self.state.id,
            bytes = bytes.len(),
            "Session saved"
        );
        Ok(())
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.store.release(mem::take(&mut self.state));
    }
}

impl fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.state.id)
            .field("fresh", &self.state.fresh)
            .field("keys", &self.state.record.len())
            .finish()
    }
}

//! The session store: shared configuration and session factory.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::config::SessionConfig;
use crate::cookie::{CookieDirective, TokenTransport};
use crate::error::Result;
use crate::keygen::{KeyGenerator, UuidKeyGenerator};
use crate::pool::{PoolStats, SessionPool};
use crate::session::Session;
use crate::storage::Storage;

/// Shared, read-only session configuration plus the pool and backend.
///
/// Build one `Store` at startup and share it (typically behind an `Arc`)
/// between request handlers. Nothing about a store changes after
/// construction; every [`Session`] borrows it immutably.
pub struct Store {
    config: SessionConfig,
    storage: Arc<dyn Storage>,
    key_generator: Box<dyn KeyGenerator>,
    pool: SessionPool,
}

impl Store {
    /// Create a store over `storage`.
    pub fn new(config: SessionConfig, storage: impl Storage + 'static) -> Self {
        Self::from_shared(config, Arc::new(storage))
    }

    /// Create a store over an already shared backend.
    pub fn from_shared(config: SessionConfig, storage: Arc<dyn Storage>) -> Self {
        let key_generator = config.key_generator.build();
        let pool = SessionPool::new(config.pool_capacity);
        Self {
            config,
            storage,
            key_generator,
            pool,
        }
    }

    /// Replace the identifier generator selected by the configuration.
    pub fn with_key_generator(mut self, key_generator: impl KeyGenerator + 'static) -> Self {
        self.key_generator = Box::new(key_generator);
        self
    }

    /// Get the store configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the storage backend.
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Session lifetime.
    pub fn expiration(&self) -> Duration {
        self.config.expiration()
    }

    /// Get pool statistics.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Resolve the session for a request cycle.
    ///
    /// When the transport carries a token whose data exists in storage, the
    /// stored record is loaded and the session is not fresh. Otherwise a
    /// fresh session with a newly generated identifier is returned; unknown
    /// tokens are never adopted as identifiers.
    pub fn get(&self, transport: &(impl TokenTransport + ?Sized)) -> Result<Session<'_>> {
        let token = transport
            .token(&self.config.cookie.name)
            .filter(|t| !t.is_empty());

        let Some(id) = token else {
            return Ok(self.create());
        };

        match self.load(&id)? {
            Some(session) => Ok(session),
            None => {
                debug!(session_id = %id, "Unknown session token, issuing new identifier");
                Ok(self.create())
            }
        }
    }

    /// Start a fresh session with a new identifier.
    pub fn create(&self) -> Session<'_> {
        let mut session = Session::new(self, self.pool.acquire());
        session.state.id = self.generate_id();

        trace!(session_id = %session.id(), "Created fresh session");
        session
    }

    /// Load the session stored under `id`.
    ///
    /// Returns `Ok(None)` if the backend holds nothing for `id`.
    pub fn load(&self, id: &str) -> Result<Option<Session<'_>>> {
        // Built before the backend call so every early return releases it
        let mut session = Session::new(self, self.pool.acquire());

        let bytes = match self.storage.get(id) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to load session");
                return Err(e.into());
            }
        };

        session.state.record.deserialize(&bytes)?;
        session.state.id.push_str(id);
        session.state.fresh = false;

        debug!(
            session_id = %id,
            keys = session.len(),
            "Session loaded from storage"
        );
        Ok(Some(session))
    }

    /// Delete the stored data for `id` without resolving a session.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.storage.delete(id)?;
        debug!(session_id = %id, "Session deleted from storage");
        Ok(())
    }

    pub(crate) fn generate_id(&self) -> String {
        let id = self.key_generator.generate();
        if id.is_empty() {
            warn!("Key generator returned an empty identifier, falling back to UUID");
            return UuidKeyGenerator.generate();
        }
        id
    }

    pub(crate) fn release(&self, state: crate::pool::SessionState) {
        self.pool.release(state);
    }

    /// Directive issuing `id` to the client for the configured lifetime.
    pub(crate) fn issue_directive(&self, id: &str) -> CookieDirective {
        let cookie = &self.config.cookie;
        let expiration = self.expiration();
        let expires = chrono::Duration::from_std(expiration)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        CookieDirective {
            name: cookie.name.clone(),
            value: id.to_string(),
            path: cookie.path.clone(),
            domain: cookie.domain.clone(),
            max_age: i64::try_from(expiration.as_secs()).unwrap_or(i64::MAX),
            expires,
            secure: cookie.secure,
            http_only: cookie.http_only,
            same_site: cookie.same_site,
        }
    }

    /// Directive telling the client to drop its session cookie.
    pub(crate) fn revoke_directive(&self) -> CookieDirective {
        let cookie = &self.config.cookie;
        CookieDirective {
            name: cookie.name.clone(),
            value: String::new(),
            path: cookie.path.clone(),
            domain: cookie.domain.clone(),
            max_age: -1,
            expires: Utc::now() - chrono::Duration::minutes(1),
            secure: cookie.secure,
            http_only: cookie.http_only,
            same_site: cookie.same_site,
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("pool", &self.pool.stats())
            .finish_non_exhaustive()
    }
}

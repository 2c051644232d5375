//! Pooled session lifecycle engine with pluggable TTL storage.
//!
//! This crate keeps per-client key/value records alive across independent
//! requests:
//! - A [`Store`] holds immutable configuration, the storage backend and a
//!   pool of reusable session objects
//! - A [`Session`] binds one [`Record`] to an identifier for one request
//!   cycle and exposes save, destroy and regenerate
//! - [`Storage`] abstracts the TTL key/value backend; [`MemoryStorage`] and
//!   [`FileStorage`] are provided
//! - [`TokenTransport`] abstracts how the identifier cookie travels
//!
//! # Example
//!
//! ```rust
//! use satchel_session::{CookieExchange, MemoryStorage, SessionConfig, Store};
//!
//! let store = Store::new(SessionConfig::default(), MemoryStorage::new());
//!
//! // First request: no cookie yet
//! let mut exchange = CookieExchange::new();
//! let mut session = store.get(&exchange).unwrap();
//! session.set("user", "alice");
//! session.save(&mut exchange).unwrap();
//!
//! // Next request presents the issued cookie
//! let cookie = exchange.response_token("session_id").unwrap().clone();
//! let next = CookieExchange::new().with_request_token(cookie.name, cookie.value);
//! let session = store.get(&next).unwrap();
//! assert_eq!(session.get("user").and_then(|v| v.as_str()), Some("alice"));
//! ```

mod config;
mod cookie;
mod error;
mod file_storage;
mod keygen;
mod pool;
mod record;
mod session;
mod storage;
mod store;

pub use config::{
    CookieConfig, DEFAULT_COOKIE_NAME, DEFAULT_EXPIRATION_SECS, DEFAULT_POOL_CAPACITY,
    KeyGeneratorKind, SessionConfig,
};
pub use cookie::{CookieDirective, CookieExchange, SameSite, TokenTransport};
pub use error::{BackendError, Error, Result, SaveError};
pub use file_storage::FileStorage;
pub use keygen::{KeyGenerator, RANDOM_KEY_BYTES, RandomKeyGenerator, UuidKeyGenerator};
pub use pool::{PoolStats, SessionPool, SessionState};
pub use record::Record;
pub use session::Session;
pub use storage::{DEFAULT_SWEEP_THRESHOLD, MemoryStorage, Storage, StorageResult};
pub use store::Store;

//! Configuration for the session store.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cookie::SameSite;
use crate::keygen::{KeyGenerator, RandomKeyGenerator, UuidKeyGenerator};

/// Default session lifetime (24 hours).
pub const DEFAULT_EXPIRATION_SECS: u64 = 24 * 60 * 60;

/// Default session cookie name.
pub const DEFAULT_COOKIE_NAME: &str = "session_id";

/// Default number of idle session objects kept for reuse.
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// Which built-in identifier generator a store uses.
///
/// Custom generators are installed with [`Store::with_key_generator`](crate::Store::with_key_generator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyGeneratorKind {
    /// UUID v4.
    #[default]
    Uuid,
    /// 256 random bits, URL-safe base64.
    Random,
}

impl KeyGeneratorKind {
    pub(crate) fn build(self) -> Box<dyn KeyGenerator> {
        match self {
            Self::Uuid => Box::new(UuidKeyGenerator),
            Self::Random => Box::new(RandomKeyGenerator),
        }
    }
}

/// Attributes of the cookie carrying the session identifier.
///
/// ```toml
/// [session.cookie]
/// name = "session_id"
/// path = "/"
/// secure = true
/// same_site = "Strict"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub name: String,
    pub path: String,
    /// Empty means host-only.
    pub domain: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            path: String::new(),
            domain: String::new(),
            secure: false,
            http_only: false,
            same_site: SameSite::Lax,
        }
    }
}

/// Configuration for a session [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Lifetime of stored sessions and of the issued cookie, in seconds.
    pub expiration_secs: u64,

    /// Built-in identifier generator.
    pub key_generator: KeyGeneratorKind,

    /// Maximum number of idle session objects kept for reuse.
    pub pool_capacity: usize,

    /// Session cookie attributes.
    pub cookie: CookieConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_secs: DEFAULT_EXPIRATION_SECS,
            key_generator: KeyGeneratorKind::default(),
            pool_capacity: DEFAULT_POOL_CAPACITY,
            cookie: CookieConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Session lifetime.
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }

    /// Set the session lifetime (whole seconds).
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration_secs = expiration.as_secs();
        self
    }

    /// Select the built-in identifier generator.
    pub fn with_key_generator(mut self, kind: KeyGeneratorKind) -> Self {
        self.key_generator = kind;
        self
    }

    /// Set the idle pool capacity.
    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Set the cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie.name = name.into();
        self
    }

    /// Set the cookie path.
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie.path = path.into();
        self
    }

    /// Set the cookie domain.
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie.domain = domain.into();
        self
    }

    /// Mark the cookie `Secure`.
    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    /// Mark the cookie `HttpOnly`.
    pub fn with_cookie_http_only(mut self, http_only: bool) -> Self {
        self.cookie.http_only = http_only;
        self
    }

    /// Set the cookie `SameSite` attribute.
    pub fn with_cookie_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie.same_site = same_site;
        self
    }
}

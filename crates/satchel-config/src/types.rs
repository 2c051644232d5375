//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [session]          # lifetime, identifier generator, pool size
//! [session.cookie]   # cookie attributes
//! [storage]          # backend selection
//! [logging]          # log output
//! ```

use std::path::PathBuf;

use satchel_session::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Default directory for the file storage backend.
pub const DEFAULT_STORAGE_PATH: &str = ".satchel/sessions";

/// Longest accepted session lifetime (100 years).
pub const MAX_EXPIRATION_SECS: u64 = 100 * 365 * 24 * 60 * 60;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged. A section present in a later layer
/// replaces the earlier one as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatchelConfig {
    /// Session store configuration.
    pub session: Option<SessionConfig>,

    /// Storage backend configuration.
    pub storage: Option<StorageConfig>,

    /// Logging configuration.
    pub logging: Option<LoggingConfig>,
}

impl SatchelConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: SatchelConfig) {
        if other.session.is_some() {
            self.session = other.session;
        }
        if other.storage.is_some() {
            self.storage = other.storage;
        }
        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// Session configuration, or defaults.
    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    /// Storage configuration, or defaults.
    pub fn storage(&self) -> StorageConfig {
        self.storage.clone().unwrap_or_default()
    }

    /// Logging configuration, or defaults.
    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }

    /// Check values the session engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        let session = self.session();

        if session.expiration_secs == 0 {
            return Err(ConfigError::invalid(
                "session.expiration_secs",
                "must be greater than zero",
            ));
        }
        if session.expiration_secs > MAX_EXPIRATION_SECS {
            return Err(ConfigError::invalid(
                "session.expiration_secs",
                format!("must be at most {MAX_EXPIRATION_SECS}"),
            ));
        }

        let name = &session.cookie.name;
        if name.is_empty() {
            return Err(ConfigError::invalid("session.cookie.name", "must not be empty"));
        }
        if let Some(c) = name.chars().find(|c| !is_cookie_name_char(*c)) {
            return Err(ConfigError::invalid(
                "session.cookie.name",
                format!("'{c}' is not allowed in a cookie name"),
            ));
        }

        let storage = self.storage();
        if storage.kind == StorageKind::File && storage.path.as_os_str().is_empty() {
            return Err(ConfigError::invalid(
                "storage.path",
                "required for the file backend",
            ));
        }

        Ok(())
    }
}

/// RFC 6265 cookie-name characters (an HTTP token).
fn is_cookie_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Which storage backend holds session data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// In-process map; data is lost on exit.
    Memory,
    /// One file per session under `path`.
    #[default]
    File,
}

/// Storage backend configuration.
///
/// ```toml
/// [storage]
/// kind = "file"
/// path = "./.satchel/sessions"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,

    /// Directory for the file backend.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::default(),
            path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Logging configuration.
///
/// ```toml
/// [logging]
/// json = true
/// filter = "satchel_session=trace,info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,

    /// `EnvFilter` directive overriding the built-in default.
    pub filter: Option<String>,
}

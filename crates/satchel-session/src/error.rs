//! Error types for session lifecycle operations.

use std::fmt;

use crate::session::Session;

/// Error type for session lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The storage backend failed a get, set or delete.
    #[error("Storage backend error: {0}")]
    Backend(#[from] BackendError),

    /// The session record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for session lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`Storage`](crate::Storage) implementation.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// I/O failure while touching the backing medium.
    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        source: std::io::Error,
    },

    /// The backend holds data it cannot interpret.
    #[error("Corrupt entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// Any other backend-specific failure.
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// Create a free-form backend error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// A failed [`Session::save`], handing the unreleased session back.
///
/// The session keeps its identifier and record, so the caller can retry
/// with [`SaveError::into_session`] or drop it to abandon the cycle.
pub struct SaveError<'s> {
    session: Session<'s>,
    error: Error,
}

impl<'s> SaveError<'s> {
    pub(crate) fn new(session: Session<'s>, error: Error) -> Self {
        Self { session, error }
    }

    /// The underlying failure.
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Recover the session for a retry.
    pub fn into_session(self) -> Session<'s> {
        self.session
    }

    /// Split into the session and the failure.
    pub fn into_parts(self) -> (Session<'s>, Error) {
        (self.session, self.error)
    }
}

impl fmt::Debug for SaveError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveError")
            .field("session_id", &self.session.id())
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for SaveError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to save session: {}", self.error)
    }
}

impl std::error::Error for SaveError<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<SaveError<'_>> for Error {
    fn from(err: SaveError<'_>) -> Self {
        err.error
    }
}

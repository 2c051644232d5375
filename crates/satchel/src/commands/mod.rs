//! CLI command handlers.

pub mod config;
pub mod cycle;
pub mod purge;

use std::path::PathBuf;

use anyhow::Result;
use satchel_config::{ConfigSource, SatchelConfig, StorageKind};
use satchel_session::{CookieExchange, FileStorage, MemoryStorage, Store};
use tracing::debug;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resolved configuration.
    pub config: SatchelConfig,
    /// Config files that were considered.
    pub sources: Vec<ConfigSource>,
    /// Inbound session token for this cycle.
    pub token: Option<String>,
    /// File storage directory overriding the configured backend.
    pub storage_dir: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
}

impl Context {
    /// The file storage directory in effect, if the backend is file based.
    pub fn file_storage_dir(&self) -> Option<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Some(dir.clone());
        }
        let storage = self.config.storage();
        match storage.kind {
            StorageKind::File => Some(storage.path),
            StorageKind::Memory => None,
        }
    }

    /// Build the session store for this invocation.
    pub fn store(&self) -> Result<Store> {
        let session = self.config.session();
        let store = match self.file_storage_dir() {
            Some(dir) => {
                debug!(dir = %dir.display(), "Using file session storage");
                Store::new(session, FileStorage::open(dir)?)
            }
            None => {
                debug!("Using in-memory session storage");
                Store::new(session, MemoryStorage::new())
            }
        };
        Ok(store)
    }

    /// The transport for this cycle, carrying the inbound token if any.
    pub fn exchange(&self) -> CookieExchange {
        let exchange = CookieExchange::new();
        match self.token {
            Some(ref token) => {
                let name = self.config.session().cookie.name;
                exchange.with_request_token(name, token.clone())
            }
            None => exchange,
        }
    }
}

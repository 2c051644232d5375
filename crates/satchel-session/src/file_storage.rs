//! Directory-backed storage backend.
//!
//! Each session is one JSON file named after the SHA-256 digest of its key,
//! so client-supplied identifiers of any length or content map to a fixed
//! size name inside the directory. Files carry their own expiry and are
//! written via a temporary file plus rename.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::error::BackendError;
use crate::storage::{Storage, StorageResult};

/// Extension of committed session files.
const ENTRY_EXTENSION: &str = "json";

/// Extension of in-flight writes.
const TEMP_EXTENSION: &str = "tmp";

/// On-disk envelope for one session blob.
#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    /// `None` means no expiry.
    expires_at: Option<DateTime<Utc>>,

    /// Base64 of the stored bytes.
    data: String,
}

impl FileEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Storage backend keeping one file per session in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| BackendError::Io {
            key: dir.display().to_string(),
            source,
        })?;
        debug!(dir = %dir.display(), "Opened file session storage");
        Ok(Self { dir })
    }

    /// The storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let name = URL_SAFE_NO_PAD.encode(Sha256::digest(key.as_bytes()));
        self.dir.join(format!("{name}.{ENTRY_EXTENSION}"))
    }

    fn read_entry(&self, key: &str, path: &Path) -> StorageResult<Option<FileEntry>> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(BackendError::Io {
                    key: key.to_string(),
                    source,
                });
            }
        };

        let entry = serde_json::from_slice(&contents).map_err(|e| BackendError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(entry))
    }

    /// Delete every expired or unreadable session file.
    ///
    /// Returns the number of files removed.
    pub fn purge_expired(&self) -> StorageResult<usize> {
        let io_err = |source| BackendError::Io {
            key: self.dir.display().to_string(),
            source,
        };

        let now = Utc::now();
        let mut count = 0;

        for dir_entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = dir_entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }

            let stale = match fs::read(&path) {
                Ok(contents) => serde_json::from_slice::<FileEntry>(&contents)
                    .map(|entry| entry.is_expired(now))
                    .unwrap_or(true),
                Err(e) if e.kind() == ErrorKind::NotFound => false,
                Err(e) => return Err(io_err(e)),
            };

            if stale {
                match fs::remove_file(&path) {
                    Ok(()) => count += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(io_err(e)),
                }
            }
        }

        if count > 0 {
            debug!(count = count, "Purged expired session files");
        }

        Ok(count)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        let Some(entry) = self.read_entry(key, &path)? else {
            return Ok(None);
        };

        if entry.is_expired(Utc::now()) {
            trace!(session_id = %key, "Session file expired");
            return Ok(None);
        }

        let data = STANDARD
            .decode(entry.data.as_bytes())
            .map_err(|e| BackendError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Some(data))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> StorageResult<()> {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            // Past the representable range means no expiry
            chrono::Duration::from_std(ttl)
                .ok()
                .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        };

        let entry = FileEntry {
            expires_at,
            data: STANDARD.encode(value),
        };
        let contents = serde_json::to_vec(&entry).map_err(|e| BackendError::Corrupt {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let path = self.entry_path(key);
        let tmp = path.with_extension(TEMP_EXTENSION);
        let io_err = |source| BackendError::Io {
            key: key.to_string(),
            source,
        };
        fs::write(&tmp, contents).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;

        trace!(session_id = %key, path = %path.display(), "Session file written");
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(BackendError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn storage() -> (TempDir, FileStorage) {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path().join("sessions")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_set_and_get() {
        let (_dir, storage) = storage();
        storage
            .set("session-1", br#"{"user":"alice"}"#, Duration::from_secs(60))
            .unwrap();

        assert_eq!(
            storage.get("session-1").unwrap(),
            Some(br#"{"user":"alice"}"#.to_vec())
        );
        assert_eq!(storage.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_hostile_key_stays_in_dir() {
        let (dir, storage) = storage();
        storage
            .set("../../etc/passwd", b"{}", Duration::ZERO)
            .unwrap();

        assert!(!dir.path().join("etc").exists());
        assert_eq!(fs::read_dir(storage.dir()).unwrap().count(), 1);
        assert_eq!(
            storage.get("../../etc/passwd").unwrap(),
            Some(b"{}".to_vec())
        );
    }

    #[test]
    fn test_long_key_is_stored() {
        let (_dir, storage) = storage();
        let key = "k".repeat(4096);

        assert_eq!(storage.get(&key).unwrap(), None);
        storage.set(&key, b"{}", Duration::ZERO).unwrap();
        assert_eq!(storage.get(&key).unwrap(), Some(b"{}".to_vec()));
        storage.delete(&key).unwrap();
        assert_eq!(storage.get(&key).unwrap(), None);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let (_dir, storage) = storage();
        storage
            .set("session-1", b"{}", Duration::from_secs(10_000_000_000_000))
            .unwrap();
        storage.set("session-2", b"{}", Duration::MAX).unwrap();

        assert_eq!(storage.get("session-1").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(storage.get("session-2").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(storage.purge_expired().unwrap(), 0);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_dir, storage) = storage();
        storage.set("session-1", b"{}", Duration::ZERO).unwrap();

        storage.delete("session-1").unwrap();
        storage.delete("session-1").unwrap();

        assert_eq!(storage.get("session-1").unwrap(), None);
    }

    #[test]
    fn test_expiration_and_purge() {
        let (_dir, storage) = storage();
        storage
            .set("short", b"{}", Duration::from_millis(10))
            .unwrap();
        storage.set("forever", b"{}", Duration::ZERO).unwrap();

        thread::sleep(Duration::from_millis(20));

        assert_eq!(storage.get("short").unwrap(), None);
        assert_eq!(storage.purge_expired().unwrap(), 1);
        assert_eq!(storage.get("forever").unwrap(), Some(b"{}".to_vec()));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let (_dir, storage) = storage();
        fs::write(storage.entry_path("broken"), b"not json").unwrap();

        let result = storage.get("broken");
        assert!(matches!(result, Err(BackendError::Corrupt { .. })));

        // Purge treats unreadable entries as stale
        assert_eq!(storage.purge_expired().unwrap(), 1);
    }
}

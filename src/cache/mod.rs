//! Local account cache
//!
//! One namespaced entry holding the serialized account metadata list.
//! Secrets never pass through here: `Account` has no credential field and
//! the cache only ever sees `Account` values.
//!
//! A corrupt or missing payload reads as an empty list. Writes replace the
//! whole document atomically (temp file + rename), so a concurrent reader
//! observes either the old list or the new one, never a partial write.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::types::error::{MailError, Result};
use crate::types::Account;

/// Storage seam for the account metadata list
///
/// The manager is written against this trait so tests can run on the
/// in-memory implementation.
pub trait AccountCache: Send + Sync {
    /// Full account list; empty if nothing persisted or the payload is corrupt
    fn read(&self) -> Vec<Account>;

    /// Replace the persisted list
    fn write(&self, accounts: &[Account]) -> Result<()>;
}

/// File-backed cache holding one JSON document
pub struct FileAccountCache {
    path: PathBuf,
}

impl FileAccountCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AccountCache for FileAccountCache {
    fn read(&self) -> Vec<Account> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str(&raw) {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!("Corrupt account cache at {:?}, treating as empty: {}", self.path, e);
                Vec::new()
            }
        }
    }

    fn write(&self, accounts: &[Account]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MailError::Cache(format!("Failed to create cache dir: {}", e)))?;
        }

        let payload = serde_json::to_string_pretty(accounts)?;

        // Write to a sibling temp file, then rename over the target so a
        // reader never sees a half-written document.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)
            .map_err(|e| MailError::Cache(format!("Failed to write cache: {}", e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| MailError::Cache(format!("Failed to replace cache: {}", e)))?;

        debug!("Persisted {} account(s) to {:?}", accounts.len(), self.path);
        Ok(())
    }
}

/// In-memory cache for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryAccountCache {
    accounts: RwLock<Vec<Account>>,
}

impl MemoryAccountCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountCache for MemoryAccountCache {
    fn read(&self) -> Vec<Account> {
        self.accounts
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    fn write(&self, accounts: &[Account]) -> Result<()> {
        let mut guard = self
            .accounts
            .write()
            .map_err(|e| MailError::Cache(format!("Cache lock poisoned: {}", e)))?;
        *guard = accounts.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountType;

    fn account(id: &str, email: &str, is_default: bool) -> Account {
        Account {
            id: id.to_string(),
            name: String::new(),
            email: email.to_string(),
            aliases: Vec::new(),
            is_default,
            has_password: false,
            mailbox_endpoint: None,
            account_type: AccountType::Gmail,
        }
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileAccountCache::new(dir.path().join("accounts.json"));
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = FileAccountCache::new(path);
        assert!(cache.read().is_empty());
    }

    #[test]
    fn test_write_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileAccountCache::new(dir.path().join("accounts.json"));

        let accounts = vec![
            account("1", "a@x.com", true),
            account("2", "b@x.com", false),
        ];
        cache.write(&accounts).unwrap();

        assert_eq!(cache.read(), accounts);
    }

    #[test]
    fn test_write_replaces_previous_list() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileAccountCache::new(dir.path().join("accounts.json"));

        cache.write(&[account("1", "a@x.com", true)]).unwrap();
        cache.write(&[account("2", "b@x.com", true)]).unwrap();

        let read = cache.read();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].id, "2");
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileAccountCache::new(dir.path().join("nested").join("accounts.json"));
        cache.write(&[account("1", "a@x.com", true)]).unwrap();
        assert_eq!(cache.read().len(), 1);
    }

    #[test]
    fn test_memory_cache_round_trip() {
        let cache = MemoryAccountCache::new();
        assert!(cache.read().is_empty());

        let accounts = vec![account("1", "a@x.com", true)];
        cache.write(&accounts).unwrap();
        assert_eq!(cache.read(), accounts);
    }
}

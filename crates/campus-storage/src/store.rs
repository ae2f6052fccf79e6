//! Persisted store contract
//!
//! A narrow get/set/remove interface. The session manager is the only
//! writer; the HTTP client reads the token and clears the record on 401.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::StorageError;
use crate::Result;

/// Raw bearer token
pub const TOKEN_KEY: &str = "token";
/// Serialized user profile (JSON)
pub const USER_KEY: &str = "user";
/// Absolute expiry timestamp of the token
pub const TOKEN_EXPIRES_KEY: &str = "token_expires";

/// Every entry belonging to the persisted session record.
pub const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, USER_KEY, TOKEN_EXPIRES_KEY];

pub trait PersistedStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Write several entries as one logical unit.
    ///
    /// The default writes them one by one; backends with transactions
    /// override this so a failure leaves none of them written.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several entries as one logical unit.
    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

/// In-process store. Lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl PersistedStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut map = self.entries.write();
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut map = self.entries.write();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// Store for runtimes without a persistence backend. Every call fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableStore;

impl PersistedStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(StorageError::Unavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(StorageError::Unavailable)
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Err(StorageError::Unavailable)
    }
}

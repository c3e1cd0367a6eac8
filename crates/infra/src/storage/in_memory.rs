use std::collections::HashMap;
use std::sync::RwLock;

use super::r#trait::{KeyValueStorage, StorageError};

/// In-memory key-value storage.
///
/// Intended for tests/dev. Clones of the `Arc` around it share contents, which
/// is how tests simulate a restart over the same storage.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry directly (e.g. to plant malformed data in tests).
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.to_string(), value.to_string());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        map.remove(key);
        Ok(())
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored value could not be understood.
    #[error("stored entry {key:?} is malformed: {message}")]
    Corrupt { key: String, message: String },

    /// A value could not be serialized for writing.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid storage key {0:?}: use letters, digits, '-', '_' or '.'")]
    InvalidKey(String),

    /// A previous writer panicked while holding the lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

impl StorageError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StorageError::Corrupt { .. })
    }
}

/// String key/value storage (local-storage semantics).
///
/// `set` overwrites the previous value wholesale.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S> KeyValueStorage for Arc<S>
where
    S: KeyValueStorage + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Keys double as file names, so keep them to a portable character set.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

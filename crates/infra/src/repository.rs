//! JSON persistence of the line-item sequence.
//!
//! The whole sequence lives in one storage entry as a JSON array of
//! `{id, serviceId, serviceName, unitPrice, quantity}` objects and is rewritten
//! in full on every save.

use invoice_builder_invoicing::LineItem;

use crate::storage::{KeyValueStorage, StorageError, validate_key};

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "invoice-items";

#[derive(Debug, Clone)]
pub struct LineItemRepository<S> {
    storage: S,
    key: String,
}

impl<S> LineItemRepository<S> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<S: KeyValueStorage> LineItemRepository<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self { storage, key })
    }

    pub fn with_default_key(storage: S) -> Self {
        Self {
            storage,
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Load the stored sequence. An absent entry is an empty sequence;
    /// malformed JSON is `StorageError::Corrupt`.
    pub fn load(&self) -> Result<Vec<LineItem>, StorageError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            key: self.key.clone(),
            message: e.to_string(),
        })
    }

    /// Overwrite the stored sequence.
    pub fn save(&self, lines: &[LineItem]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(lines)?;
        self.storage.set(&self.key, &raw)
    }
}

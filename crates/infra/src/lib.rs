//! Infrastructure layer: local storage, persistence, config, session wiring.

pub mod config;
pub mod repository;
pub mod session;
pub mod storage;


pub use config::{AppConfig, ConfigError};
pub use repository::{DEFAULT_STORAGE_KEY, LineItemRepository};
pub use session::{CorruptStatePolicy, InvoiceSession, SessionError, SessionOptions};
pub use storage::{FileStorage, InMemoryStorage, KeyValueStorage, StorageError};

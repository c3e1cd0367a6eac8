//! Local key-value storage boundary.
//!
//! The invoice keeps its line items in a single named entry, the way a browser
//! keeps page state in local storage. This module defines the port and its
//! adapters without any knowledge of what the values mean.

pub mod file;
pub mod in_memory;
pub mod r#trait;

pub use file::FileStorage;
pub use in_memory::InMemoryStorage;
pub use r#trait::{KeyValueStorage, StorageError, validate_key};

//! Key-value storage for cart snapshots.
//!
//! The cart never needs more than one slot: the whole line list is serialized
//! and written under a single key. Backends only have to store opaque strings.

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// The slot that holds the cart snapshot.
pub const STORAGE_KEY: &str = "@GoMarketplace:products";

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the slot failed.
    #[error("storage I/O for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored bytes are not valid UTF-8 text.
    #[error("stored value for key {0} is not valid UTF-8")]
    Encoding(String),
}

impl StorageError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// An asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, or `None` if nothing is stored.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`. Deleting a missing key is not an error.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

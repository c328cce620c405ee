//! Cart error types.
//!
//! Load failures never appear here: a snapshot that cannot be read starts the
//! cart empty. Only usage mistakes and failed writes reach the caller.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart was requested outside a [`CartProvider`](crate::CartProvider) scope.
    #[error("use_cart must be called within a cart provider")]
    Usage,

    /// The in-memory change was applied but the snapshot could not be written.
    #[error("failed to persist cart to {key}: {source}")]
    Persist {
        key: String,
        #[source]
        source: StorageError,
    },

    /// The cart could not be serialized.
    #[error("failed to serialize cart: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

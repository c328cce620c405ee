//! Integration tests for GoMarketplace.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p go-marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_persistence` - Carts surviving a restart through the file backend
//! - `cart_sequences` - Invariants over long, seeded operation sequences

use std::sync::Arc;

use go_marketplace_cart::{CartHandle, FileStorage, STORAGE_KEY};
use go_marketplace_core::{NewLineItem, Price, ProductId};
use tempfile::TempDir;

/// A cart backed by files in a temporary directory.
///
/// Dropping the context deletes the directory.
pub struct TestContext {
    pub dir: TempDir,
}

impl TestContext {
    /// Create a context with an empty storage directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// The file backend rooted in this context's directory.
    #[must_use]
    pub fn storage(&self) -> FileStorage {
        FileStorage::new(self.dir.path())
    }

    /// Open the cart, as a freshly started process would.
    pub async fn open(&self) -> CartHandle {
        CartHandle::open(Arc::new(self.storage()), STORAGE_KEY).await
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A product with a fixed title, image and price.
///
/// # Panics
///
/// Panics if `id` is blank.
#[must_use]
#[allow(clippy::expect_used)]
pub fn product(id: &str) -> NewLineItem {
    NewLineItem::new(
        ProductId::parse(id).expect("valid product id"),
        format!("Product {id}"),
        format!("https://images.example/{id}.png"),
        Price::from_cents(1000),
    )
}

//! GoMarketplace Cart - Shopping-cart state with local persistence.
//!
//! A [`CartStore`] keeps an ordered, id-unique list of [`LineItem`]s in
//! memory and mirrors the whole list to a single key-value slot after every
//! mutation. The list is loaded from that slot once, when the store opens.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use go_marketplace_cart::{CartHandle, MemoryStorage, STORAGE_KEY};
//! use go_marketplace_core::{NewLineItem, Price, ProductId};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let cart = CartHandle::open(Arc::new(MemoryStorage::new()), STORAGE_KEY).await;
//!
//! let shirt = NewLineItem::new(ProductId::parse("A")?, "Shirt", "u", Price::from_cents(1000));
//! cart.add_to_cart(shirt).await?;
//! cart.increment(&ProductId::parse("A")?).await?;
//!
//! assert_eq!(cart.snapshot().await[0].quantity, 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`store`] - The cart state container and its operations
//! - [`context`] - Shared handles and the provider scope
//! - [`storage`] - Key-value storage backends (memory, file)
//! - [`config`] - Environment-based configuration
//! - [`error`] - Error types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod context;
pub mod error;
pub mod storage;
pub mod store;

pub use config::{CartConfig, ConfigError};
pub use context::{CartHandle, CartProvider};
pub use error::{CartError, Result};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, STORAGE_KEY, StorageError};
pub use store::{CartStore, LoadOutcome, MutationOutcome};

pub use go_marketplace_core::{CartSummary, LineItem, NewLineItem, Price, ProductId};

//! Sharing one cart between consumers.
//!
//! A [`CartHandle`] is created once and passed explicitly to whatever needs
//! the cart. Clones share the same [`CartStore`]. Calls are serialized through
//! an async mutex that stays locked across the storage write, so two rapid
//! mutations can never persist out of order.
//!
//! [`CartProvider`] is the scope a handle is installed into; asking it for the
//! cart before one is provided is a usage error.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use go_marketplace_core::{CartSummary, LineItem, NewLineItem, ProductId};

use crate::error::{CartError, Result};
use crate::storage::KeyValueStore;
use crate::store::{CartStore, LoadOutcome, MutationOutcome};

/// Cheaply cloneable, shared access to one [`CartStore`].
#[derive(Clone, Debug)]
pub struct CartHandle {
    inner: Arc<Mutex<CartStore>>,
}

impl CartHandle {
    /// Wrap an existing store.
    #[must_use]
    pub fn new(store: CartStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Open a store over `storage` (loading its snapshot) and wrap it.
    pub async fn open(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self::new(CartStore::open(storage, key).await)
    }

    /// Lock the store for a sequence of operations.
    pub async fn lock(&self) -> MutexGuard<'_, CartStore> {
        self.inner.lock().await
    }

    /// A copy of the current lines.
    pub async fn snapshot(&self) -> Vec<LineItem> {
        self.inner.lock().await.items().to_vec()
    }

    /// The line for `id`, if any.
    pub async fn get(&self, id: &ProductId) -> Option<LineItem> {
        self.inner.lock().await.get(id).cloned()
    }

    /// Totals over the current lines.
    pub async fn summary(&self) -> CartSummary {
        self.inner.lock().await.summary()
    }

    /// See [`CartStore::load`].
    pub async fn reload(&self) -> LoadOutcome {
        self.inner.lock().await.load().await
    }

    /// See [`CartStore::add_to_cart`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    pub async fn add_to_cart(&self, item: NewLineItem) -> Result<MutationOutcome> {
        self.inner.lock().await.add_to_cart(item).await
    }

    /// See [`CartStore::increment`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    pub async fn increment(&self, id: &ProductId) -> Result<MutationOutcome> {
        self.inner.lock().await.increment(id).await
    }

    /// See [`CartStore::decrement`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    pub async fn decrement(&self, id: &ProductId) -> Result<MutationOutcome> {
        self.inner.lock().await.decrement(id).await
    }

    /// See [`CartStore::remove`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    pub async fn remove(&self, id: &ProductId) -> Result<Option<LineItem>> {
        self.inner.lock().await.remove(id).await
    }

    /// See [`CartStore::clear`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    pub async fn clear(&self) -> Result<MutationOutcome> {
        self.inner.lock().await.clear().await
    }

    /// See [`CartStore::flush`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    pub async fn flush(&self) -> Result<()> {
        self.inner.lock().await.flush().await
    }
}

/// The scope a [`CartHandle`] is provided into.
#[derive(Clone, Debug, Default)]
pub struct CartProvider {
    cart: Option<CartHandle>,
}

impl CartProvider {
    /// An empty scope with no cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { cart: None }
    }

    /// A scope holding `cart`.
    #[must_use]
    pub fn with_cart(cart: CartHandle) -> Self {
        Self { cart: Some(cart) }
    }

    /// Install `cart`, replacing any previous one.
    pub fn provide(&mut self, cart: CartHandle) {
        self.cart = Some(cart);
    }

    /// The provided cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Usage`] if no cart has been provided.
    pub fn use_cart(&self) -> Result<CartHandle> {
        self.cart.clone().ok_or(CartError::Usage)
    }
}

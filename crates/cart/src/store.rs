//! Cart state container.
//!
//! [`CartStore`] owns the in-memory line list and writes the whole list to its
//! storage slot after every change. Every write payload is serialized from the
//! state *after* the change, so the stored snapshot always matches memory once
//! a write succeeds.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use go_marketplace_core::{CartSummary, LineItem, NewLineItem, ProductId};

use crate::error::{CartError, Result};
use crate::storage::KeyValueStore;

/// What [`CartStore::load`] found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored under the key.
    Empty,
    /// A snapshot was restored.
    Restored {
        /// Number of lines restored.
        items: usize,
    },
    /// A snapshot existed but could not be used; the cart was left as it was.
    Discarded {
        /// Why the snapshot was rejected.
        reason: String,
    },
}

/// Whether a mutation changed the cart.
///
/// `Unchanged` mutations are no-ops and do not touch storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Changed,
    Unchanged,
}

/// An ordered, id-unique cart mirrored to a key-value slot.
pub struct CartStore {
    items: Vec<LineItem>,
    storage: Arc<dyn KeyValueStore>,
    key: String,
    loaded: bool,
    dirty: bool,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("key", &self.key)
            .field("items", &self.items)
            .field("loaded", &self.loaded)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create an empty, not yet loaded store over `storage`.
    pub fn new(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            storage,
            key: key.into(),
            loaded: false,
            dirty: false,
        }
    }

    /// Create a store and load its snapshot.
    pub async fn open(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let mut store = Self::new(storage, key);
        store.load().await;
        store
    }

    /// Replace the in-memory cart with the stored snapshot, if there is a usable one.
    ///
    /// Never fails: a missing, unreadable, or malformed snapshot leaves the
    /// cart untouched (empty on a fresh store) and is reported through the
    /// returned [`LoadOutcome`]. Duplicate ids in a snapshot keep their first
    /// occurrence.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn load(&mut self) -> LoadOutcome {
        self.loaded = true;

        let raw = match self.storage.get_item(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored cart");
                return LoadOutcome::Empty;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored cart, starting empty");
                return LoadOutcome::Discarded {
                    reason: e.to_string(),
                };
            }
        };

        let items: Vec<LineItem> = match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Stored cart is malformed, starting empty");
                return LoadOutcome::Discarded {
                    reason: e.to_string(),
                };
            }
        };

        let total = items.len();
        let mut seen = HashSet::new();
        let items: Vec<LineItem> = items
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        if items.len() < total {
            warn!(
                dropped = total - items.len(),
                "Stored cart had duplicate ids, keeping first occurrences"
            );
        }

        info!(items = items.len(), "Restored cart");
        self.items = items;
        self.dirty = false;
        LoadOutcome::Restored {
            items: self.items.len(),
        }
    }

    /// The current lines, in display order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The line for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Totals over the current lines.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::of(&self.items)
    }

    /// The storage key this cart is mirrored to.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether [`load`](Self::load) has run.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether the in-memory cart has changes that failed to persist.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Add one unit of `item`.
    ///
    /// A new id is appended with quantity 1. An id already in the cart has its
    /// quantity raised by 1; the stored title, image and price are kept.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    /// The in-memory change is kept either way.
    #[instrument(skip(self, item), fields(key = %self.key, id = %item.id))]
    pub async fn add_to_cart(&mut self, item: NewLineItem) -> Result<MutationOutcome> {
        let outcome = match self.items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => bump(line),
            None => {
                self.items.push(item.with_quantity(1));
                MutationOutcome::Changed
            }
        };
        self.commit(outcome).await
    }

    /// Raise the quantity of `id` by 1. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn increment(&mut self, id: &ProductId) -> Result<MutationOutcome> {
        let outcome = self
            .items
            .iter_mut()
            .find(|line| &line.id == id)
            .map_or(MutationOutcome::Unchanged, bump);
        self.commit(outcome).await
    }

    /// Lower the quantity of `id` by 1.
    ///
    /// Unknown ids and lines already at zero are a no-op. A line that reaches
    /// zero stays in the cart; use [`remove`](Self::remove) to drop it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn decrement(&mut self, id: &ProductId) -> Result<MutationOutcome> {
        let outcome = match self.items.iter_mut().find(|line| &line.id == id) {
            Some(line) if line.quantity > 0 => {
                line.quantity -= 1;
                MutationOutcome::Changed
            }
            _ => MutationOutcome::Unchanged,
        };
        self.commit(outcome).await
    }

    /// Drop the line for `id` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn remove(&mut self, id: &ProductId) -> Result<Option<LineItem>> {
        let Some(pos) = self.items.iter().position(|line| &line.id == id) else {
            return Ok(None);
        };
        let removed = self.items.remove(pos);
        self.persist().await?;
        Ok(Some(removed))
    }

    /// Drop every line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn clear(&mut self) -> Result<MutationOutcome> {
        let outcome = if self.items.is_empty() {
            MutationOutcome::Unchanged
        } else {
            self.items.clear();
            MutationOutcome::Changed
        };
        self.commit(outcome).await
    }

    /// Write the current cart again, e.g. after a failed write.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persist`] if the snapshot could not be written.
    #[instrument(skip(self), fields(key = %self.key))]
    pub async fn flush(&mut self) -> Result<()> {
        self.persist().await
    }

    async fn commit(&mut self, outcome: MutationOutcome) -> Result<MutationOutcome> {
        if outcome == MutationOutcome::Changed {
            self.persist().await?;
        }
        Ok(outcome)
    }

    async fn persist(&mut self) -> Result<()> {
        self.dirty = true;
        let payload = serde_json::to_string(&self.items)?;

        if let Err(source) = self.storage.set_item(&self.key, &payload).await {
            warn!(error = %source, "Failed to persist cart");
            return Err(CartError::Persist {
                key: self.key.clone(),
                source,
            });
        }

        self.dirty = false;
        debug!(items = self.items.len(), "Persisted cart");
        Ok(())
    }
}

fn bump(line: &mut LineItem) -> MutationOutcome {
    match line.quantity.checked_add(1) {
        Some(quantity) => {
            line.quantity = quantity;
            MutationOutcome::Changed
        }
        None => {
            warn!(id = %line.id, "Quantity at maximum, ignoring increment");
            MutationOutcome::Unchanged
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use go_marketplace_core::Price;

    use super::*;
    use crate::storage::{MemoryStorage, STORAGE_KEY, StorageError};

    fn id(s: &str) -> ProductId {
        ProductId::parse(s).unwrap()
    }

    fn product(s: &str) -> NewLineItem {
        NewLineItem::new(id(s), "Shirt", "u", Price::from_cents(1000))
    }

    async fn stored(storage: &MemoryStorage) -> Vec<LineItem> {
        let raw = storage.get_item(STORAGE_KEY).await.unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    async fn empty_store() -> (Arc<MemoryStorage>, CartStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = CartStore::open(storage.clone(), STORAGE_KEY).await;
        (storage, store)
    }

    /// Storage whose writes fail while `failing` is set.
    #[derive(Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        failing: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStorage {
        async fn get_item(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
            self.inner.get_item(key).await
        }

        async fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::io(
                    key,
                    std::io::Error::other("disk full"),
                ));
            }
            self.inner.set_item(key, value).await
        }

        async fn remove_item(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.remove_item(key).await
        }
    }

    #[tokio::test]
    async fn test_load_without_stored_data() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CartStore::new(storage, STORAGE_KEY);
        assert!(!store.is_loaded());

        assert_eq!(store.load().await, LoadOutcome::Empty);
        assert!(store.is_loaded());
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_add_new_item_starts_at_one() {
        let (storage, mut store) = empty_store().await;

        let outcome = store.add_to_cart(product("A")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Changed);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0], product("A").with_quantity(1));
        assert_eq!(stored(&storage).await, store.items());
    }

    #[tokio::test]
    async fn test_add_existing_item_increments() {
        let (storage, mut store) = empty_store().await;

        store.add_to_cart(product("A")).await.unwrap();
        store.add_to_cart(product("A")).await.unwrap();

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].quantity, 2);
        assert_eq!(stored(&storage).await[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_add_existing_keeps_original_details() {
        let (_, mut store) = empty_store().await;

        store.add_to_cart(product("A")).await.unwrap();
        let renamed = NewLineItem::new(id("A"), "Renamed", "other", Price::from_cents(1));
        store.add_to_cart(renamed).await.unwrap();

        let line = store.get(&id("A")).unwrap();
        assert_eq!(line.title, "Shirt");
        assert_eq!(line.price, Price::from_cents(1000));
        assert_eq!(line.quantity, 2);
    }

    #[tokio::test]
    async fn test_insertion_order_is_preserved() {
        let (_, mut store) = empty_store().await;

        for name in ["C", "A", "B", "A"] {
            store.add_to_cart(product(name)).await.unwrap();
        }

        let ids: Vec<&str> = store.items().iter().map(|line| line.id.as_str()).collect();
        assert_eq!(ids, ["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_increment_missing_is_noop() {
        let (storage, mut store) = empty_store().await;
        store.add_to_cart(product("A")).await.unwrap();

        let outcome = store.increment(&id("missing-id")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Unchanged);
        assert_eq!(store.items(), [product("A").with_quantity(1)]);
        assert_eq!(stored(&storage).await, store.items());
    }

    #[tokio::test]
    async fn test_increment_touches_only_matching_line() {
        let (storage, mut store) = empty_store().await;
        store.add_to_cart(product("A")).await.unwrap();
        store.add_to_cart(product("B")).await.unwrap();

        store.increment(&id("B")).await.unwrap();

        assert_eq!(store.get(&id("A")).unwrap().quantity, 1);
        assert_eq!(store.get(&id("B")).unwrap().quantity, 2);
        assert_eq!(stored(&storage).await, store.items());
    }

    #[tokio::test]
    async fn test_decrement_to_zero_keeps_line() {
        let (storage, mut store) = empty_store().await;
        store.add_to_cart(product("A")).await.unwrap();
        store.add_to_cart(product("A")).await.unwrap();

        store.decrement(&id("A")).await.unwrap();
        store.decrement(&id("A")).await.unwrap();

        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].quantity, 0);
        assert_eq!(stored(&storage).await[0].quantity, 0);
    }

    #[tokio::test]
    async fn test_decrement_at_zero_is_noop() {
        let (_, mut store) = empty_store().await;
        store.add_to_cart(product("A")).await.unwrap();
        store.decrement(&id("A")).await.unwrap();

        let outcome = store.decrement(&id("A")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Unchanged);
        assert_eq!(store.items()[0].quantity, 0);
        assert_eq!(
            store.decrement(&id("missing-id")).await.unwrap(),
            MutationOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn test_increment_at_maximum_is_noop() {
        let raw = serde_json::to_string(&[product("A").with_quantity(u32::MAX)]).unwrap();
        let storage = Arc::new(MemoryStorage::with_item(STORAGE_KEY, &raw));
        let mut store = CartStore::open(storage, STORAGE_KEY).await;

        assert_eq!(
            store.increment(&id("A")).await.unwrap(),
            MutationOutcome::Unchanged
        );
        assert_eq!(store.items()[0].quantity, u32::MAX);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (storage, mut store) = empty_store().await;
        store.add_to_cart(product("A")).await.unwrap();
        store.add_to_cart(product("B")).await.unwrap();

        let removed = store.remove(&id("A")).await.unwrap();
        assert_eq!(removed.map(|line| line.id), Some(id("A")));
        assert!(store.remove(&id("A")).await.unwrap().is_none());
        assert_eq!(stored(&storage).await, store.items());

        assert_eq!(store.clear().await.unwrap(), MutationOutcome::Changed);
        assert!(stored(&storage).await.is_empty());
        assert_eq!(store.clear().await.unwrap(), MutationOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_reload_matches_memory() {
        let (storage, mut store) = empty_store().await;
        store.add_to_cart(product("A")).await.unwrap();
        store.add_to_cart(product("B")).await.unwrap();
        store.increment(&id("A")).await.unwrap();
        store.decrement(&id("B")).await.unwrap();

        let reopened = CartStore::open(storage, STORAGE_KEY).await;
        assert_eq!(reopened.items(), store.items());
    }

    #[tokio::test]
    async fn test_malformed_snapshot_starts_empty() {
        let storage = Arc::new(MemoryStorage::with_item(STORAGE_KEY, "{not json"));
        let mut store = CartStore::new(storage, STORAGE_KEY);

        assert!(matches!(
            store.load().await,
            LoadOutcome::Discarded { .. }
        ));
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_in_snapshot_keep_first() {
        let raw = serde_json::to_string(&[
            product("A").with_quantity(3),
            product("B").with_quantity(1),
            product("A").with_quantity(7),
        ])
        .unwrap();
        let storage = Arc::new(MemoryStorage::with_item(STORAGE_KEY, &raw));
        let mut store = CartStore::new(storage, STORAGE_KEY);

        assert_eq!(store.load().await, LoadOutcome::Restored { items: 2 });
        assert_eq!(store.get(&id("A")).unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_and_flush_recovers() {
        let storage = Arc::new(FlakyStorage::default());
        let mut store = CartStore::open(storage.clone(), STORAGE_KEY).await;

        storage.failing.store(true, Ordering::SeqCst);
        let err = store.add_to_cart(product("A")).await.unwrap_err();

        assert!(matches!(err, CartError::Persist { .. }));
        assert_eq!(store.items().len(), 1);
        assert!(store.is_dirty());
        assert_eq!(storage.inner.get_item(STORAGE_KEY).await.unwrap(), None);

        storage.failing.store(false, Ordering::SeqCst);
        store.flush().await.unwrap();

        assert!(!store.is_dirty());
        assert_eq!(stored(&storage.inner).await, store.items());
    }

    #[tokio::test]
    async fn test_summary() {
        let (_, mut store) = empty_store().await;
        store.add_to_cart(product("A")).await.unwrap();
        store.add_to_cart(product("A")).await.unwrap();
        store.add_to_cart(product("B")).await.unwrap();

        let summary = store.summary();
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.subtotal.display(), "$30.00");
    }

    #[tokio::test]
    async fn test_extreme_prices_reload_unchanged() {
        let (storage, mut store) = empty_store().await;
        let finest: Price = "12345678901.2345".parse().unwrap();
        store
            .add_to_cart(NewLineItem::new(id("A"), "Max", "u", Price::MAX))
            .await
            .unwrap();
        store
            .add_to_cart(NewLineItem::new(id("B"), "Fine", "u", finest))
            .await
            .unwrap();

        let mut reopened = CartStore::new(storage, STORAGE_KEY);
        assert_eq!(reopened.load().await, LoadOutcome::Restored { items: 2 });
        assert_eq!(reopened.items(), store.items());
        assert_eq!(reopened.get(&id("A")).unwrap().price, Price::MAX);
    }

    #[tokio::test]
    async fn test_summary_at_max_price() {
        let (_, mut store) = empty_store().await;
        let item = NewLineItem::new(id("A"), "Max", "u", Price::MAX);
        store.add_to_cart(item.clone()).await.unwrap();
        store.add_to_cart(item).await.unwrap();

        let summary = store.summary();
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.subtotal, Price::MAX.times(2));
    }
}

//! Cart line items.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// One product entry in the cart with its quantity.
///
/// The serialized field names (`id`, `title`, `image_url`, `price`,
/// `quantity`) are the storage format of a cart snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
    pub quantity: u32,
}

impl LineItem {
    /// Price of the whole line (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// A product about to be added to the cart.
///
/// Carries every [`LineItem`] field except the quantity, which the cart owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    pub price: Price,
}

impl NewLineItem {
    /// Create a new item.
    #[must_use]
    pub fn new(
        id: ProductId,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }

    /// Turn this into a line with the given quantity.
    #[must_use]
    pub fn with_quantity(self, quantity: u32) -> LineItem {
        LineItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity,
        }
    }
}

/// Totals over a set of cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CartSummary {
    /// Number of distinct lines, including lines at quantity zero.
    pub line_count: usize,
    /// Sum of all quantities.
    pub item_count: u64,
    /// Sum of every line total.
    pub subtotal: Price,
}

impl CartSummary {
    /// Compute totals for `items`.
    #[must_use]
    pub fn of(items: &[LineItem]) -> Self {
        Self {
            line_count: items.len(),
            item_count: items.iter().map(|item| u64::from(item.quantity)).sum(),
            subtotal: items.iter().map(LineItem::line_total).sum(),
        }
    }
}

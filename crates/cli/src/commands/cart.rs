//! Cart commands.
//!
//! # Environment Variables
//!
//! - `GO_MARKETPLACE_STORAGE_DIR` - Directory holding the cart file
//! - `GO_MARKETPLACE_STORAGE_KEY` - Storage slot key

use std::fmt::Write as _;

use go_marketplace_cart::{CartError, CartHandle, MutationOutcome};
use go_marketplace_core::{
    CartSummary, LineItem, NewLineItem, Price, PriceError, ProductId, ProductIdError,
};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while running a cart command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The product id argument is invalid.
    #[error("Invalid product id: {0}")]
    InvalidProductId(#[from] ProductIdError),

    /// The price argument is invalid.
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),

    /// The cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Render every line.
pub async fn list(cart: &CartHandle) -> String {
    format_items(&cart.snapshot().await)
}

/// Add one unit of a product.
///
/// # Errors
///
/// Returns an error if the id or price is invalid, or the cart cannot be saved.
pub async fn add(
    cart: &CartHandle,
    id: &str,
    title: String,
    image_url: String,
    price: &str,
) -> Result<String, CommandError> {
    let id = ProductId::parse(id)?;
    let price: Price = price.parse()?;

    cart.add_to_cart(NewLineItem::new(id.clone(), title, image_url, price))
        .await?;
    info!(%id, "Added to cart");

    Ok(line_status(cart, &id).await)
}

/// Raise a line's quantity by one.
///
/// # Errors
///
/// Returns an error if the id is invalid or the cart cannot be saved.
pub async fn increment(cart: &CartHandle, id: &str) -> Result<String, CommandError> {
    let id = ProductId::parse(id)?;
    let outcome = cart.increment(&id).await?;
    Ok(describe(cart, &id, outcome).await)
}

/// Lower a line's quantity by one.
///
/// # Errors
///
/// Returns an error if the id is invalid or the cart cannot be saved.
pub async fn decrement(cart: &CartHandle, id: &str) -> Result<String, CommandError> {
    let id = ProductId::parse(id)?;
    let outcome = cart.decrement(&id).await?;
    Ok(describe(cart, &id, outcome).await)
}

/// Drop a line.
///
/// # Errors
///
/// Returns an error if the id is invalid or the cart cannot be saved.
pub async fn remove(cart: &CartHandle, id: &str) -> Result<String, CommandError> {
    let id = ProductId::parse(id)?;
    Ok(match cart.remove(&id).await? {
        Some(line) => format!("Removed {} ({})", line.id, line.title),
        None => format!("{id} is not in the cart"),
    })
}

/// Drop every line.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub async fn clear(cart: &CartHandle) -> Result<String, CommandError> {
    Ok(match cart.clear().await? {
        MutationOutcome::Changed => "Cart cleared".to_string(),
        MutationOutcome::Unchanged => "Cart is already empty".to_string(),
    })
}

/// Render cart totals.
pub async fn summary(cart: &CartHandle) -> String {
    format_summary(&cart.summary().await)
}

async fn describe(cart: &CartHandle, id: &ProductId, outcome: MutationOutcome) -> String {
    match (outcome, cart.get(id).await) {
        (_, None) => format!("{id} is not in the cart"),
        (MutationOutcome::Unchanged, Some(line)) => {
            format!("{} unchanged (quantity {})", line.id, line.quantity)
        }
        (MutationOutcome::Changed, Some(line)) => format_line(&line),
    }
}

async fn line_status(cart: &CartHandle, id: &ProductId) -> String {
    cart.get(id)
        .await
        .map_or_else(|| format!("{id} is not in the cart"), |line| format_line(&line))
}

fn format_line(line: &LineItem) -> String {
    format!(
        "{} x{} {} @ {} = {}",
        line.id,
        line.quantity,
        line.title,
        line.price.display(),
        line.line_total().display()
    )
}

/// Render lines one per row, in cart order.
pub fn format_items(items: &[LineItem]) -> String {
    if items.is_empty() {
        return "Cart is empty".to_string();
    }

    let mut out = String::new();
    for line in items {
        let _ = writeln!(out, "{}", format_line(line));
    }
    let _ = write!(out, "{}", format_summary(&CartSummary::of(items)));
    out
}

/// Render totals.
pub fn format_summary(summary: &CartSummary) -> String {
    format!(
        "{} line(s), {} item(s), subtotal {}",
        summary.line_count,
        summary.item_count,
        summary.subtotal.display()
    )
}

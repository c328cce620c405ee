//! Core types for GoMarketplace.
//!
//! This module provides type-safe wrappers for the cart's domain concepts.

pub mod id;
pub mod line_item;
pub mod price;

pub use id::{ProductId, ProductIdError};
pub use line_item::{CartSummary, LineItem, NewLineItem};
pub use price::{Price, PriceError};

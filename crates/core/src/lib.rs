//! GoMarketplace Core - Shared cart types.
//!
//! This crate provides the domain types used across all GoMarketplace components:
//! - `cart` - Cart state container with persistence
//! - `cli` - Command-line front end for inspecting and editing a cart
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, line items, and cart summaries

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

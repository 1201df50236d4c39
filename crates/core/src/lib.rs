//! Verdant Core - Shared types library.
//!
//! This crate provides common types used across all Verdant components:
//! - `storefront` - Session state core (cart, checkout, orders, wishlist)
//! - the display layer and future service crates
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no timers, no store
//! logic. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

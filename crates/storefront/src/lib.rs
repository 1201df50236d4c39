//! Verdant Storefront session core.
//!
//! This crate holds the per-session state of the storefront: the active
//! cart, the two-stage checkout flow, the order history, and the
//! wishlist. It performs no I/O of its own - the display layer reads
//! derived state and invokes operations, authentication and the product
//! catalog are external collaborators, and durable storage sits behind
//! the [`persistence`] trait boundary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod models;
pub mod orders;
pub mod persistence;
pub mod session;
pub mod wishlist;

pub use cart::{CartLine, CartStore};
pub use checkout::{
    CheckoutError, CheckoutFlow, CheckoutStage, CheckoutTotals, ShippingDetails, ShippingField,
    ValidationErrors,
};
pub use config::{ConfigError, StoreConfig};
pub use error::StoreError;
pub use models::{ProfileUpdate, User};
pub use orders::{Order, OrderHistory};
pub use persistence::{MemoryPersistence, PersistenceError, PersistenceService};
pub use session::Session;
pub use wishlist::{WishlistEntry, WishlistStore};

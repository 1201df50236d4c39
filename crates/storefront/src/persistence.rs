//! Persistence boundary.
//!
//! The reference storefront keeps cart, wishlist, and order history
//! entirely in transient session state. This module makes the storage
//! boundary explicit instead of silently dropping durability: a
//! [`PersistenceService`] trait with the same invariants as the live
//! stores (most importantly, a persisted cart line never has a zero
//! quantity), plus an in-memory implementation for tests and for
//! running without a backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use verdant_core::UserId;

use crate::cart::CartLine;
use crate::orders::Order;
use crate::wishlist::WishlistEntry;

/// Storage boundary failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PersistenceError {
    /// A cart line with quantity 0 was handed to the store. Lines at 0
    /// are removed, never persisted.
    #[error("persisted cart line for product {product_id} has zero quantity")]
    ZeroQuantityLine {
        /// The offending product.
        product_id: String,
    },

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Durable storage for per-user session state.
///
/// Implementations must uphold the store invariants: persisted cart
/// lines have quantity >= 1, wishlists hold at most one entry per
/// product, order lists stay most-recent-first.
#[allow(async_fn_in_trait)] // implementations live in this workspace; no Send bound needed
pub trait PersistenceService {
    /// Load the saved cart lines for a user (empty if none saved).
    async fn load_cart(&self, user: &UserId) -> Result<Vec<CartLine>, PersistenceError>;

    /// Replace the saved cart for a user.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::ZeroQuantityLine`] if any line has
    /// quantity 0.
    async fn save_cart(&self, user: &UserId, lines: &[CartLine]) -> Result<(), PersistenceError>;

    /// Load the order history for a user, most recent first.
    async fn load_orders(&self, user: &UserId) -> Result<Vec<Order>, PersistenceError>;

    /// Prepend one order to a user's history.
    async fn append_order(&self, user: &UserId, order: &Order) -> Result<(), PersistenceError>;

    /// Load the saved wishlist for a user.
    async fn load_wishlist(&self, user: &UserId) -> Result<Vec<WishlistEntry>, PersistenceError>;

    /// Replace the saved wishlist for a user.
    async fn save_wishlist(
        &self,
        user: &UserId,
        entries: &[WishlistEntry],
    ) -> Result<(), PersistenceError>;
}

/// Reject cart lines the stores would never produce.
fn check_lines(lines: &[CartLine]) -> Result<(), PersistenceError> {
    match lines.iter().find(|line| line.quantity == 0) {
        Some(line) => Err(PersistenceError::ZeroQuantityLine {
            product_id: line.product.id.to_string(),
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Default, Clone)]
struct UserRecords {
    cart: Vec<CartLine>,
    orders: Vec<Order>,
    wishlist: Vec<WishlistEntry>,
}

/// In-memory [`PersistenceService`] keyed by user.
///
/// Cheaply cloneable handle; clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    records: Arc<Mutex<HashMap<UserId, UserRecords>>>,
}

impl MemoryPersistence {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, UserRecords>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PersistenceService for MemoryPersistence {
    async fn load_cart(&self, user: &UserId) -> Result<Vec<CartLine>, PersistenceError> {
        Ok(self
            .lock()
            .get(user)
            .map(|records| records.cart.clone())
            .unwrap_or_default())
    }

    async fn save_cart(&self, user: &UserId, lines: &[CartLine]) -> Result<(), PersistenceError> {
        check_lines(lines)?;
        self.lock().entry(user.clone()).or_default().cart = lines.to_vec();
        Ok(())
    }

    async fn load_orders(&self, user: &UserId) -> Result<Vec<Order>, PersistenceError> {
        Ok(self
            .lock()
            .get(user)
            .map(|records| records.orders.clone())
            .unwrap_or_default())
    }

    async fn append_order(&self, user: &UserId, order: &Order) -> Result<(), PersistenceError> {
        self.lock()
            .entry(user.clone())
            .or_default()
            .orders
            .insert(0, order.clone());
        Ok(())
    }

    async fn load_wishlist(&self, user: &UserId) -> Result<Vec<WishlistEntry>, PersistenceError> {
        Ok(self
            .lock()
            .get(user)
            .map(|records| records.wishlist.clone())
            .unwrap_or_default())
    }

    async fn save_wishlist(
        &self,
        user: &UserId,
        entries: &[WishlistEntry],
    ) -> Result<(), PersistenceError> {
        self.lock().entry(user.clone()).or_default().wishlist = entries.to_vec();
        Ok(())
    }
}

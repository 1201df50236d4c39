//! Wishlist store.
//!
//! A companion collection with set semantics keyed by product id: no
//! quantities, one entry per product, each stamped with when it was
//! saved.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use verdant_core::{Product, ProductId};

use crate::cart::CartStore;

/// A saved product plus the moment it was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub product: Product,
    pub added: DateTime<Utc>,
}

/// The wishlist for one shopping session.
///
/// Cheaply cloneable handle; clones share the same state. Independent
/// of the cart - moving an item between the two is two separate store
/// operations, not a transaction.
#[derive(Debug, Clone, Default)]
pub struct WishlistStore {
    entries: Arc<Mutex<Vec<WishlistEntry>>>,
}

impl WishlistStore {
    /// Create an empty wishlist.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<WishlistEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Save a product. No-op if it is already on the wishlist.
    pub fn add(&self, product: &Product) {
        let mut entries = self.lock();
        if entries.iter().any(|entry| entry.product.id == product.id) {
            return;
        }
        debug!(product_id = %product.id, "wishlist entry added");
        entries.push(WishlistEntry {
            product: product.clone(),
            added: Utc::now(),
        });
    }

    /// Remove a product. Silently does nothing if it is absent.
    pub fn remove(&self, product_id: &ProductId) {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|entry| entry.product.id != *product_id);
        if entries.len() != before {
            debug!(product_id = %product_id, "wishlist entry removed");
        }
    }

    /// Whether a product is on the wishlist.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.lock()
            .iter()
            .any(|entry| entry.product.id == *product_id)
    }

    /// Replace the entries wholesale from persisted state, keeping the
    /// first entry per product id (set semantics).
    pub(crate) fn restore_entries(&self, entries: Vec<WishlistEntry>) {
        let mut seen = std::collections::HashSet::new();
        *self.lock() = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.product.id.clone()))
            .collect();
    }

    /// Snapshot of the entries, in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<WishlistEntry> {
        self.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Move one product into the cart, if it is in stock.
    ///
    /// Returns whether the move happened. Out-of-stock products stay
    /// on the wishlist untouched.
    pub fn move_to_cart(&self, product_id: &ProductId, cart: &CartStore) -> bool {
        let product = self
            .lock()
            .iter()
            .find(|entry| entry.product.id == *product_id)
            .map(|entry| entry.product.clone());
        match product {
            Some(product) if product.in_stock => {
                cart.add_to_cart(&product);
                self.remove(product_id);
                true
            }
            _ => false,
        }
    }

    /// Move every in-stock product into the cart.
    ///
    /// Iterates a stable snapshot so removing entries mid-move can
    /// neither skip nor duplicate any. Returns the number moved.
    pub fn move_all_to_cart(&self, cart: &CartStore) -> usize {
        let snapshot = self.entries();
        let mut moved = 0;
        for entry in snapshot {
            if entry.product.in_stock {
                cart.add_to_cart(&entry.product);
                self.remove(&entry.product.id);
                moved += 1;
            }
        }
        debug!(moved, "wishlist moved to cart");
        moved
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use verdant_core::Price;

    fn product(id: &str, in_stock: bool) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            image: String::new(),
            description: String::new(),
            contents: Vec::new(),
            dosage: String::new(),
            price: Price::new(250),
            original_price: None,
            rating: 4.0,
            reviews: 12,
            category: "Herbs & Supplements".to_owned(),
            in_stock,
        }
    }

    #[test]
    fn test_set_semantics() {
        let wishlist = WishlistStore::new();
        let item = product("1", true);

        wishlist.add(&item);
        wishlist.add(&item);
        assert_eq!(wishlist.len(), 1);
        assert!(wishlist.contains(&item.id));
    }

    #[test]
    fn test_repeat_add_keeps_original_timestamp() {
        let wishlist = WishlistStore::new();
        let item = product("1", true);

        wishlist.add(&item);
        let first_added = wishlist.entries().first().unwrap().added;
        wishlist.add(&item);
        assert_eq!(wishlist.entries().first().unwrap().added, first_added);
    }

    #[test]
    fn test_remove_absent_is_silent() {
        let wishlist = WishlistStore::new();
        wishlist.remove(&ProductId::new("missing"));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_move_all_skips_out_of_stock() {
        let wishlist = WishlistStore::new();
        let cart = CartStore::default();
        wishlist.add(&product("1", true));
        wishlist.add(&product("2", false));
        wishlist.add(&product("3", true));

        let moved = wishlist.move_all_to_cart(&cart);

        assert_eq!(moved, 2);
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(wishlist.len(), 1);
        assert!(wishlist.contains(&ProductId::new("2")));
        assert!(!cart.contains(&ProductId::new("2")));
    }

    #[test]
    fn test_move_single_item() {
        let wishlist = WishlistStore::new();
        let cart = CartStore::default();
        wishlist.add(&product("1", true));

        assert!(wishlist.move_to_cart(&ProductId::new("1"), &cart));
        assert!(wishlist.is_empty());
        assert_eq!(cart.quantity_of(&ProductId::new("1")), Some(1));

        // Already moved: nothing to do.
        assert!(!wishlist.move_to_cart(&ProductId::new("1"), &cart));
    }

    #[test]
    fn test_move_single_out_of_stock_stays() {
        let wishlist = WishlistStore::new();
        let cart = CartStore::default();
        wishlist.add(&product("2", false));

        assert!(!wishlist.move_to_cart(&ProductId::new("2"), &cart));
        assert_eq!(wishlist.len(), 1);
        assert!(cart.is_empty());
    }
}

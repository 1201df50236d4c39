//! Cart store.
//!
//! Holds the mutable line-item collection for one shopping session and
//! derives totals from it on every read. The only asynchronous piece is
//! the transient notification's deferred auto-clear; everything else is
//! synchronous and runs to completion per operation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use verdant_core::{Price, Product, ProductId};

use crate::config::StoreConfig;

/// One product entry in the cart plus its quantity.
///
/// Invariant: the store never holds a line with quantity 0 - a line
/// reaching 0 is removed instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Snapshot of the product at the time it was added.
    pub product: Product,
    /// Units of the product, always >= 1 inside the store.
    pub quantity: u32,
}

impl CartLine {
    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// A transient notification, stamped with the generation that created
/// it so a superseded auto-clear timer firing late is a no-op.
#[derive(Debug)]
struct Notice {
    message: String,
    generation: u64,
}

#[derive(Debug, Default)]
struct CartState {
    lines: Vec<CartLine>,
    notification: Option<Notice>,
    generation: u64,
}

/// The active cart for one shopping session.
///
/// Cheaply cloneable handle; clones share the same underlying state.
/// The mutex only serializes the deferred notification timer against
/// the session's own operations - there are no cross-session writers.
#[derive(Debug, Clone)]
pub struct CartStore {
    state: Arc<Mutex<CartState>>,
    notification_ttl: Duration,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(CartState::default())),
            notification_ttl: config.notification_ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        // State is a plain collection and stays valid even if a holder
        // panicked, so recover rather than propagate poisoning.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one unit of a product.
    ///
    /// If a line for the product already exists its quantity is
    /// incremented, otherwise a new line is appended. Stock status is
    /// not checked here - purchasability is enforced by the display
    /// layer and at checkout.
    pub fn add_to_cart(&self, product: &Product) {
        let message = {
            let mut state = self.lock();
            if let Some(line) = state
                .lines
                .iter_mut()
                .find(|line| line.product.id == product.id)
            {
                line.quantity = line.quantity.saturating_add(1);
                debug!(product_id = %product.id, quantity = line.quantity, "cart line incremented");
                format!("{} quantity updated in cart!", product.name)
            } else {
                state.lines.push(CartLine {
                    product: product.clone(),
                    quantity: 1,
                });
                debug!(product_id = %product.id, "cart line added");
                format!("{} added to cart!", product.name)
            }
        };
        self.set_notification(message);
    }

    /// Remove the line for a product. Silently does nothing if the
    /// product is not in the cart.
    pub fn remove_from_cart(&self, product_id: &ProductId) {
        let mut state = self.lock();
        let before = state.lines.len();
        state.lines.retain(|line| line.product.id != *product_id);
        if state.lines.len() != before {
            debug!(product_id = %product_id, "cart line removed");
        }
        state.notification = None;
    }

    /// Set a line's quantity to an absolute value.
    ///
    /// A quantity of 0 removes the line. Unknown product ids are
    /// silently ignored. (Negative quantities are unrepresentable; the
    /// reference behavior's `<= 0` rule collapses into the 0 case.)
    pub fn update_quantity(&self, product_id: &ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_from_cart(product_id);
            return;
        }
        let mut state = self.lock();
        if let Some(line) = state
            .lines
            .iter_mut()
            .find(|line| line.product.id == *product_id)
        {
            line.quantity = quantity;
            debug!(product_id = %product_id, quantity, "cart quantity set");
        }
        state.notification = None;
    }

    /// Empty the cart and clear any notification.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.lines.clear();
        state.notification = None;
        debug!("cart cleared");
    }

    /// Snapshot of the current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.lock().lines.clone()
    }

    /// Replace the lines wholesale from persisted state.
    ///
    /// Zero-quantity lines are dropped rather than stored; the live
    /// cart upholds the quantity >= 1 invariant even against a
    /// misbehaving backend.
    pub(crate) fn restore_lines(&self, lines: Vec<CartLine>) {
        let mut state = self.lock();
        state.lines = lines.into_iter().filter(|line| line.quantity > 0).collect();
        state.notification = None;
    }

    /// Quantity of a product currently in the cart, if any.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> Option<u32> {
        self.lock()
            .lines
            .iter()
            .find(|line| line.product.id == *product_id)
            .map(|line| line.quantity)
    }

    /// Whether a product has a line in the cart.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.quantity_of(product_id).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }

    /// Sum of quantities over all lines. Recomputed on every read so it
    /// can never drift from the line collection.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lock()
            .lines
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.quantity))
    }

    /// Sum of price x quantity over all lines. Recomputed on every read.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lock().lines.iter().map(CartLine::line_total).sum()
    }

    /// The pending notification message, if one is visible.
    #[must_use]
    pub fn notification(&self) -> Option<String> {
        self.lock()
            .notification
            .as_ref()
            .map(|notice| notice.message.clone())
    }

    /// Dismiss the pending notification immediately.
    pub fn clear_notification(&self) {
        self.lock().notification = None;
    }

    /// Show a notification and schedule its auto-clear.
    ///
    /// Each notification owns its own deferred clear: the spawned task
    /// captures the generation that created it and only clears the
    /// notification if that generation is still current when the timer
    /// fires. Without a tokio runtime (plain unit tests) no timer is
    /// scheduled and the notification stays until explicitly cleared
    /// or overwritten.
    fn set_notification(&self, message: String) {
        let generation = {
            let mut state = self.lock();
            state.generation = state.generation.wrapping_add(1);
            let generation = state.generation;
            state.notification = Some(Notice {
                message,
                generation,
            });
            generation
        };

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let state = Arc::clone(&self.state);
            let ttl = self.notification_ttl;
            handle.spawn(async move {
                tokio::time::sleep(ttl).await;
                let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                let current = state
                    .notification
                    .as_ref()
                    .is_some_and(|notice| notice.generation == generation);
                if current {
                    state.notification = None;
                }
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use verdant_core::ProductId;

    fn product(id: &str, name: &str, price: u64) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            image: format!("https://cdn.example.com/{id}.jpg"),
            description: String::new(),
            contents: Vec::new(),
            dosage: String::new(),
            price: Price::new(price),
            original_price: None,
            rating: 4.0,
            reviews: 10,
            category: "Herbs & Supplements".to_owned(),
            in_stock: true,
        }
    }

    #[test]
    fn test_repeated_add_merges_into_one_line() {
        let cart = CartStore::default();
        let ashwagandha = product("1", "Ashwagandha Capsules", 899);

        for _ in 0..3 {
            cart.add_to_cart(&ashwagandha);
        }

        let lines = cart.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().unwrap().quantity, 3);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.subtotal(), Price::new(2697));
    }

    #[test]
    fn test_add_notifications() {
        let cart = CartStore::default();
        let ashwagandha = product("1", "Ashwagandha Capsules", 899);

        cart.add_to_cart(&ashwagandha);
        assert_eq!(
            cart.notification().as_deref(),
            Some("Ashwagandha Capsules added to cart!")
        );

        cart.add_to_cart(&ashwagandha);
        assert_eq!(
            cart.notification().as_deref(),
            Some("Ashwagandha Capsules quantity updated in cart!")
        );
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let cart = CartStore::default();
        cart.add_to_cart(&product("2", "Triphala Churna", 549));
        cart.add_to_cart(&product("1", "Ashwagandha Capsules", 899));

        let ids: Vec<_> = cart
            .lines()
            .into_iter()
            .map(|line| line.product.id.into_inner())
            .collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn test_update_quantity_absolute_set() {
        let cart = CartStore::default();
        let triphala = product("2", "Triphala Churna", 549);
        cart.add_to_cart(&triphala);
        cart.add_to_cart(&triphala);

        cart.update_quantity(&triphala.id, 5);
        assert_eq!(cart.quantity_of(&triphala.id), Some(5));
        assert_eq!(cart.subtotal(), Price::new(2745));
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let cart = CartStore::default();
        let triphala = product("2", "Triphala Churna", 549);
        cart.add_to_cart(&triphala);

        cart.update_quantity(&triphala.id, 0);
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.subtotal(), Price::ZERO);
    }

    #[test]
    fn test_update_quantity_unknown_id_is_noop() {
        let cart = CartStore::default();
        cart.add_to_cart(&product("1", "Ashwagandha Capsules", 899));

        cart.update_quantity(&ProductId::new("missing"), 4);
        assert_eq!(cart.total_items(), 1);
    }

    #[test]
    fn test_remove_is_silent_when_absent() {
        let cart = CartStore::default();
        cart.remove_from_cart(&ProductId::new("missing"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_clears_notification() {
        let cart = CartStore::default();
        let ashwagandha = product("1", "Ashwagandha Capsules", 899);
        cart.add_to_cart(&ashwagandha);
        assert!(cart.notification().is_some());

        cart.remove_from_cart(&ashwagandha.id);
        assert!(cart.notification().is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_empties_everything() {
        let cart = CartStore::default();
        cart.add_to_cart(&product("1", "Ashwagandha Capsules", 899));
        cart.add_to_cart(&product("2", "Triphala Churna", 549));

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.notification().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_auto_clears_after_ttl() {
        let cart = CartStore::default();
        cart.add_to_cart(&product("1", "Ashwagandha Capsules", 899));
        assert!(cart.notification().is_some());

        tokio::time::advance(Duration::from_millis(3001)).await;
        tokio::task::yield_now().await;

        assert!(cart.notification().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_clear_newer_notification() {
        let cart = CartStore::default();
        let ashwagandha = product("1", "Ashwagandha Capsules", 899);

        cart.add_to_cart(&ashwagandha);
        tokio::time::advance(Duration::from_millis(2000)).await;

        // Second notification supersedes the first; the first timer
        // fires at t=3000 and must not clear it.
        cart.add_to_cart(&ashwagandha);
        tokio::time::advance(Duration::from_millis(1500)).await;
        tokio::task::yield_now().await;
        assert_eq!(
            cart.notification().as_deref(),
            Some("Ashwagandha Capsules quantity updated in cart!")
        );

        // The second timer fires at t=5000.
        tokio::time::advance(Duration::from_millis(1501)).await;
        tokio::task::yield_now().await;
        assert!(cart.notification().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_clear_beats_pending_timer() {
        let cart = CartStore::default();
        cart.add_to_cart(&product("1", "Ashwagandha Capsules", 899));

        cart.clear_notification();
        assert!(cart.notification().is_none());

        // The stale timer firing later stays a no-op.
        tokio::time::advance(Duration::from_millis(3001)).await;
        tokio::task::yield_now().await;
        assert!(cart.notification().is_none());
    }
}

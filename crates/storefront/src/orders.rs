//! Order record and per-user order history.
//!
//! An [`Order`] is the immutable snapshot produced by a successful
//! checkout: the lines and total are copied at placement time, so later
//! catalog price changes never retroactively affect a placed order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use verdant_core::{OrderId, OrderStatus, PaymentMethod, Price};

use crate::cart::CartLine;
use crate::checkout::ShippingDetails;

/// A placed order.
///
/// `lines` and `total_amount` are frozen at placement time. `status`
/// is an informational label owned by the external fulfillment system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique order identifier (`ORD...`).
    pub id: OrderId,
    /// Snapshot of the cart lines at placement time.
    pub lines: Vec<CartLine>,
    /// Shipping details as validated at placement time.
    pub shipping: ShippingDetails,
    /// How the shopper chose to pay.
    pub payment_method: PaymentMethod,
    /// Final total including the delivery charge.
    pub total_amount: Price,
    /// When the order was placed.
    pub order_date: DateTime<Utc>,
    /// Fulfillment status label.
    pub status: OrderStatus,
}

impl Order {
    /// Number of units across all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |sum, line| sum.saturating_add(line.quantity))
    }
}

/// Append-only order history for one user, most recent first.
///
/// Cheaply cloneable handle; clones share the same history.
#[derive(Debug, Clone, Default)]
pub struct OrderHistory {
    orders: Arc<Mutex<Vec<Order>>>,
}

impl OrderHistory {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Order>> {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Prepend an order. No de-duplication: the checkout flow
    /// guarantees exactly one call per placement.
    pub fn append(&self, order: Order) {
        debug!(order_id = %order.id, "order appended to history");
        self.lock().insert(0, order);
    }

    /// Replace the history wholesale from persisted state.
    pub(crate) fn restore_orders(&self, orders: Vec<Order>) {
        *self.lock() = orders;
    }

    /// Full ordered history, most recent first.
    #[must_use]
    pub fn list(&self) -> Vec<Order> {
        self.lock().clone()
    }

    /// The most recently placed order.
    #[must_use]
    pub fn latest(&self) -> Option<Order> {
        self.lock().first().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use verdant_core::{Price, Product, ProductId};

    fn order(id: &str, total: u64) -> Order {
        Order {
            id: OrderId::new(id),
            lines: vec![CartLine {
                product: Product {
                    id: ProductId::new("1"),
                    name: "Ashwagandha Capsules".to_owned(),
                    image: String::new(),
                    description: String::new(),
                    contents: Vec::new(),
                    dosage: String::new(),
                    price: Price::new(899),
                    original_price: None,
                    rating: 4.5,
                    reviews: 324,
                    category: "Herbs & Supplements".to_owned(),
                    in_stock: true,
                },
                quantity: 2,
            }],
            shipping: ShippingDetails::default(),
            payment_method: PaymentMethod::CashOnDelivery,
            total_amount: Price::new(total),
            order_date: Utc::now(),
            status: OrderStatus::Pending,
        }
    }

    #[test]
    fn test_append_prepends() {
        let history = OrderHistory::new();
        history.append(order("ORD00000001", 1798));
        history.append(order("ORD00000002", 549));

        let ids: Vec<_> = history
            .list()
            .into_iter()
            .map(|o| o.id.into_inner())
            .collect();
        assert_eq!(ids, ["ORD00000002", "ORD00000001"]);
        assert_eq!(
            history.latest().unwrap().total_amount,
            Price::new(549)
        );
    }

    #[test]
    fn test_listing_is_a_snapshot() {
        let history = OrderHistory::new();
        history.append(order("ORD00000001", 1798));

        let snapshot = history.list();
        history.append(order("ORD00000002", 549));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_order_total_items() {
        assert_eq!(order("ORD00000001", 1798).total_items(), 2);
    }

    #[test]
    fn test_empty_history() {
        let history = OrderHistory::new();
        assert!(history.is_empty());
        assert!(history.latest().is_none());
    }
}

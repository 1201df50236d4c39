//! Catalog product type.
//!
//! Products come from the catalog service and are read-only inside the
//! session core: the cart and wishlist hold snapshots of them but never
//! mutate them.

use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::money::Price;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Stable catalog identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Primary image URL.
    pub image: String,
    /// Short description.
    pub description: String,
    /// Ingredient list.
    pub contents: Vec<String>,
    /// Usage instructions.
    pub dosage: String,
    /// Current selling price.
    pub price: Price,
    /// Pre-discount price, when the product is on offer. Greater than
    /// `price` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Price>,
    /// Average review rating, 0.0-5.0.
    pub rating: f32,
    /// Number of reviews behind the rating.
    pub reviews: u32,
    /// Catalog category label.
    pub category: String,
    /// Whether the product can currently be purchased.
    pub in_stock: bool,
}

impl Product {
    /// Discount percentage relative to `original_price`, rounded down.
    ///
    /// `None` when the product is not on offer or the offer price is
    /// not actually lower.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        let original = self.original_price?;
        if original <= self.price || original.is_zero() {
            return None;
        }
        let saved = original.saturating_sub(self.price).amount();
        u32::try_from(saved * 100 / original.amount()).ok()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(price: u64, original: Option<u64>) -> Product {
        Product {
            id: ProductId::new("1"),
            name: "Ashwagandha Capsules".to_owned(),
            image: "https://cdn.example.com/ashwagandha.jpg".to_owned(),
            description: "Premium quality Ashwagandha root extract capsules".to_owned(),
            contents: vec!["Ashwagandha Root Extract (500mg)".to_owned()],
            dosage: "Take 1-2 capsules daily".to_owned(),
            price: Price::new(price),
            original_price: original.map(Price::new),
            rating: 4.5,
            reviews: 324,
            category: "Herbs & Supplements".to_owned(),
            in_stock: true,
        }
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(product(899, Some(1199)).discount_percent(), Some(25));
        assert_eq!(product(500, Some(1000)).discount_percent(), Some(50));
    }

    #[test]
    fn test_no_discount_without_original_price() {
        assert_eq!(product(899, None).discount_percent(), None);
    }

    #[test]
    fn test_no_discount_when_original_not_higher() {
        assert_eq!(product(899, Some(899)).discount_percent(), None);
        assert_eq!(product(899, Some(500)).discount_percent(), None);
    }

    #[test]
    fn test_serde_omits_absent_original_price() {
        let json = serde_json::to_value(product(899, None)).unwrap();
        assert!(json.get("originalPrice").is_none());
        assert!(json.get("original_price").is_none());
    }
}

//! Integration tests for Verdant.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p verdant-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_lifecycle` - cart to placed order, end to end
//! - `cart_properties` - randomized mutation sequences against a model
//! - `wishlist_to_order` - wishlist/cart interplay through checkout
//!
//! This crate also provides shared fixtures: catalog sample products
//! and helpers to drive a checkout to a given stage.

use verdant_core::{Price, Product, ProductId};
use verdant_storefront::{CheckoutFlow, ShippingField};

/// Initialize tracing for a test binary. Safe to call more than once.
pub fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_test_writer()
        .try_init();
}

/// A catalog product fixture.
#[must_use]
pub fn product(id: &str, name: &str, price: u64, in_stock: bool) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        image: format!("https://cdn.example.com/{id}.jpg"),
        description: format!("{name} from the Verdant catalog"),
        contents: vec![format!("{name} extract")],
        dosage: "As directed".to_owned(),
        price: Price::new(price),
        original_price: None,
        rating: 4.4,
        reviews: 120,
        category: "Herbs & Supplements".to_owned(),
        in_stock,
    }
}

/// Fill a checkout's shipping form with valid values.
pub fn fill_valid_shipping(flow: &CheckoutFlow) {
    let values = [
        (ShippingField::FirstName, "John"),
        (ShippingField::LastName, "Doe"),
        (ShippingField::Email, "john.doe@example.com"),
        (ShippingField::Phone, "9876543210"),
        (ShippingField::Address, "123 Main Street, Apartment 4B"),
        (ShippingField::City, "Mumbai"),
        (ShippingField::State, "Maharashtra"),
        (ShippingField::Pincode, "400001"),
    ];
    for (field, value) in values {
        flow.set_field(field, value)
            .unwrap_or_else(|e| panic!("setting {field:?} failed: {e}"));
    }
}

//! Randomized cart mutation sequences checked against a reference
//! model.
//!
//! The derived totals are recomputed from the line collection on every
//! read, so after any sequence of operations they must match a naive
//! model exactly.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;

use rand::Rng;

use verdant_core::{Price, Product};
use verdant_integration_tests::product;
use verdant_storefront::CartStore;

fn catalog() -> Vec<Product> {
    vec![
        product("1", "Ashwagandha Capsules", 899, true),
        product("2", "Triphala Churna", 549, true),
        product("3", "Brahmi Tablets", 349, true),
        product("4", "Tulsi Drops", 300, true),
        product("5", "Chyawanprash", 425, false),
        product("6", "Neem Capsules", 199, true),
    ]
}

/// Naive reference model: product id -> (unit price, quantity).
#[derive(Default)]
struct Model {
    lines: HashMap<String, (u64, u32)>,
}

impl Model {
    fn add(&mut self, product: &Product) {
        self.lines
            .entry(product.id.to_string())
            .and_modify(|(_, qty)| *qty += 1)
            .or_insert((product.price.amount(), 1));
    }

    fn update(&mut self, id: &str, qty: u32) {
        if !self.lines.contains_key(id) {
            return;
        }
        if qty == 0 {
            self.lines.remove(id);
        } else if let Some((_, model_qty)) = self.lines.get_mut(id) {
            *model_qty = qty;
        }
    }

    fn remove(&mut self, id: &str) {
        self.lines.remove(id);
    }

    fn total_items(&self) -> u32 {
        self.lines.values().map(|(_, qty)| qty).sum()
    }

    fn subtotal(&self) -> u64 {
        self.lines.values().map(|(price, qty)| price * u64::from(*qty)).sum()
    }
}

fn assert_matches_model(cart: &CartStore, model: &Model, step: usize) {
    assert_eq!(cart.total_items(), model.total_items(), "items at step {step}");
    assert_eq!(
        cart.subtotal(),
        Price::new(model.subtotal()),
        "subtotal at step {step}"
    );
    assert_eq!(cart.lines().len(), model.lines.len(), "lines at step {step}");
}

#[test]
fn test_totals_track_randomized_mutation_sequences() {
    let catalog = catalog();
    let mut rng = rand::rng();

    for _ in 0..50 {
        let cart = CartStore::default();
        let mut model = Model::default();

        for step in 0..200 {
            let item = catalog.get(rng.random_range(0..catalog.len())).unwrap();
            match rng.random_range(0..4u8) {
                0 | 1 => {
                    cart.add_to_cart(item);
                    model.add(item);
                }
                2 => {
                    let qty = rng.random_range(0..5u32);
                    cart.update_quantity(&item.id, qty);
                    model.update(item.id.as_str(), qty);
                }
                _ => {
                    cart.remove_from_cart(&item.id);
                    model.remove(item.id.as_str());
                }
            }
            assert_matches_model(&cart, &model, step);
        }
    }
}

#[test]
fn test_every_line_stays_positive_after_random_churn() {
    let catalog = catalog();
    let mut rng = rand::rng();
    let cart = CartStore::default();

    for _ in 0..500 {
        let item = catalog.get(rng.random_range(0..catalog.len())).unwrap();
        if rng.random_range(0..2) == 0 {
            cart.add_to_cart(item);
        } else {
            cart.update_quantity(&item.id, rng.random_range(0..3u32));
        }
        assert!(cart.lines().iter().all(|line| line.quantity >= 1));
    }
}

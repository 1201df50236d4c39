//! Core types for Verdant.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod product;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Price;
pub use product::Product;
pub use status::{OrderStatus, PaymentMethod};

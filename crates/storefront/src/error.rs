//! Unified error handling.
//!
//! Provides a unified `StoreError` type for embedding layers that work
//! across the session core's boundaries. Operations that can only fail
//! one way keep their specific error type; session-level entry points
//! return `StoreError`.
//!
//! Not-found conditions (removing an absent cart line or wishlist
//! entry) are deliberately not errors: those operations succeed
//! silently.

use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::persistence::PersistenceError;

/// Session-core error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A checkout transition or placement was rejected.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// The persistence boundary failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

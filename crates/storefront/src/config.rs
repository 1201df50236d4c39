//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; every field has a default matching the
//! reference storefront behavior.
//!
//! - `VERDANT_FREE_DELIVERY_THRESHOLD` - subtotal above which delivery
//!   is free, in whole rupees (default: 500)
//! - `VERDANT_DELIVERY_FEE` - flat delivery fee below the threshold,
//!   in whole rupees (default: 50)
//! - `VERDANT_NOTIFICATION_TTL_MS` - how long a cart notification stays
//!   visible before auto-clearing (default: 3000)
//! - `VERDANT_PAYMENT_DELAY_MS` - simulated payment processing delay
//!   (default: 2000)

use std::time::Duration;

use thiserror::Error;

use verdant_core::Price;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Session-core configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Subtotal strictly above this ships free.
    pub free_delivery_threshold: Price,
    /// Flat delivery fee charged at or below the threshold.
    pub delivery_fee: Price,
    /// Lifetime of a transient cart notification.
    pub notification_ttl: Duration,
    /// Simulated payment processing delay during order placement.
    pub payment_delay: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            free_delivery_threshold: Price::new(500),
            delivery_fee: Price::new(50),
            notification_ttl: Duration::from_millis(3000),
            payment_delay: Duration::from_millis(2000),
        }
    }
}

impl StoreConfig {
    /// Load configuration from the environment, falling back to
    /// defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but
    /// does not parse as an unsigned integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            free_delivery_threshold: env_u64("VERDANT_FREE_DELIVERY_THRESHOLD")?
                .map_or(defaults.free_delivery_threshold, Price::new),
            delivery_fee: env_u64("VERDANT_DELIVERY_FEE")?
                .map_or(defaults.delivery_fee, Price::new),
            notification_ttl: env_u64("VERDANT_NOTIFICATION_TTL_MS")?
                .map_or(defaults.notification_ttl, Duration::from_millis),
            payment_delay: env_u64("VERDANT_PAYMENT_DELAY_MS")?
                .map_or(defaults.payment_delay, Duration::from_millis),
        })
    }
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_owned(), e.to_string())),
        Err(_) => Ok(None),
    }
}

//! Shopping session.
//!
//! A [`Session`] groups the per-user stores: the active cart, the
//! wishlist, and the order history. There is exactly one session per
//! shopper and no shared state between sessions; absence of a user
//! means a guest session with an empty cart and no history.

use tracing::{debug, info};

use verdant_core::SessionId;

use crate::cart::CartStore;
use crate::checkout::{CheckoutError, CheckoutFlow};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{ProfileUpdate, User};
use crate::orders::OrderHistory;
use crate::persistence::PersistenceService;
use crate::wishlist::WishlistStore;

/// One shopper's in-memory state.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    config: StoreConfig,
    user: Option<User>,
    /// The active cart.
    pub cart: CartStore,
    /// Saved-for-later products.
    pub wishlist: WishlistStore,
    /// Placed orders, most recent first.
    pub orders: OrderHistory,
}

impl Session {
    /// Start a guest session: empty cart, no order history.
    #[must_use]
    pub fn guest(config: StoreConfig) -> Self {
        Self::build(None, config)
    }

    /// Start a session for a signed-in user.
    #[must_use]
    pub fn for_user(user: User, config: StoreConfig) -> Self {
        Self::build(Some(user), config)
    }

    fn build(user: Option<User>, config: StoreConfig) -> Self {
        let id = SessionId::generate();
        debug!(session_id = %id, logged_in = user.is_some(), "session started");
        Self {
            id,
            cart: CartStore::new(&config),
            wishlist: WishlistStore::new(),
            orders: OrderHistory::new(),
            user,
            config,
        }
    }

    /// Start a session for a signed-in user, rehydrating cart,
    /// wishlist, and order history from storage.
    ///
    /// # Errors
    ///
    /// Returns the persistence failure, if any; no partial session is
    /// handed out.
    pub async fn restore(
        user: User,
        config: StoreConfig,
        storage: &impl PersistenceService,
    ) -> Result<Self, StoreError> {
        let user_id = user.id.clone();
        let session = Self::build(Some(user), config);
        session
            .cart
            .restore_lines(storage.load_cart(&user_id).await?);
        session
            .wishlist
            .restore_entries(storage.load_wishlist(&user_id).await?);
        session
            .orders
            .restore_orders(storage.load_orders(&user_id).await?);
        info!(session_id = %session.id, user_id = %user_id, "session restored");
        Ok(session)
    }

    /// Save the cart and wishlist for a signed-in user. Orders are
    /// appended at placement time via
    /// [`PersistenceService::append_order`], not rewritten here.
    ///
    /// Guest sessions have nothing to persist; this is a no-op for
    /// them.
    ///
    /// # Errors
    ///
    /// Returns the persistence failure, if any.
    pub async fn persist(&self, storage: &impl PersistenceService) -> Result<(), StoreError> {
        let Some(user) = &self.user else {
            return Ok(());
        };
        storage.save_cart(&user.id, &self.cart.lines()).await?;
        storage
            .save_wishlist(&user.id, &self.wishlist.entries())
            .await?;
        Ok(())
    }

    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Merge a partial profile edit. Returns `false` for guest
    /// sessions, which have no profile.
    pub fn update_profile(&mut self, update: ProfileUpdate) -> bool {
        match &mut self.user {
            Some(user) => {
                user.apply(update);
                true
            }
            None => false,
        }
    }

    /// Start a checkout for the current cart.
    ///
    /// Entry requires a non-empty cart; whether a guest may check out
    /// at all is gated by the display layer before calling this.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if there is nothing to buy.
    pub fn begin_checkout(&self) -> Result<CheckoutFlow, StoreError> {
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }
        debug!(session_id = %self.id, items = self.cart.total_items(), "checkout started");
        Ok(CheckoutFlow::new(self.config.clone()))
    }
}

//! Checkout flow.
//!
//! A two-stage state machine converting the active cart into a placed
//! order: `CollectingDetails` -> `SelectingPayment` -> `Placed`. Field
//! validation returns the full set of violated fields so the display
//! layer can show them all at once, and order placement is guarded
//! against re-entrant invocation while the simulated payment delay is
//! in flight.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use verdant_core::{Email, OrderId, OrderStatus, PaymentMethod, Price};

use crate::cart::{CartLine, CartStore};
use crate::config::StoreConfig;
use crate::orders::{Order, OrderHistory};

/// A shipping form field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ShippingField {
    FirstName,
    LastName,
    Email,
    Phone,
    Address,
    City,
    State,
    Pincode,
}

impl ShippingField {
    /// All fields, in form order.
    pub const ALL: [Self; 8] = [
        Self::FirstName,
        Self::LastName,
        Self::Email,
        Self::Phone,
        Self::Address,
        Self::City,
        Self::State,
        Self::Pincode,
    ];
}

/// Field-level validation errors, keyed by field.
///
/// A value, not an error type: validation never panics or throws, it
/// reports every violated field simultaneously.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<ShippingField, String>);

impl ValidationErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The message for a field, if it failed validation.
    #[must_use]
    pub fn get(&self, field: ShippingField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ShippingField, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }

    fn insert(&mut self, field: ShippingField, message: &str) {
        self.0.insert(field, message.to_owned());
    }

    fn remove(&mut self, field: ShippingField) {
        self.0.remove(&field);
    }
}

/// Shipping details collected in the first checkout stage.
///
/// Fields hold the raw user input; [`ShippingDetails::validate`]
/// decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl ShippingDetails {
    fn field(&self, field: ShippingField) -> &str {
        match field {
            ShippingField::FirstName => &self.first_name,
            ShippingField::LastName => &self.last_name,
            ShippingField::Email => &self.email,
            ShippingField::Phone => &self.phone,
            ShippingField::Address => &self.address,
            ShippingField::City => &self.city,
            ShippingField::State => &self.state,
            ShippingField::Pincode => &self.pincode,
        }
    }

    fn field_mut(&mut self, field: ShippingField) -> &mut String {
        match field {
            ShippingField::FirstName => &mut self.first_name,
            ShippingField::LastName => &mut self.last_name,
            ShippingField::Email => &mut self.email,
            ShippingField::Phone => &mut self.phone,
            ShippingField::Address => &mut self.address,
            ShippingField::City => &mut self.city,
            ShippingField::State => &mut self.state,
            ShippingField::Pincode => &mut self.pincode,
        }
    }

    /// The phone number reduced to its digits.
    #[must_use]
    pub fn normalized_phone(&self) -> String {
        self.phone.chars().filter(char::is_ascii_digit).collect()
    }

    /// Run all field rules and return every violated field.
    #[must_use]
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();

        let required = [
            (ShippingField::FirstName, "First name is required"),
            (ShippingField::LastName, "Last name is required"),
            (ShippingField::Email, "Email is required"),
            (ShippingField::Phone, "Phone number is required"),
            (ShippingField::Address, "Address is required"),
            (ShippingField::City, "City is required"),
            (ShippingField::State, "State is required"),
            (ShippingField::Pincode, "Pincode is required"),
        ];
        for (field, message) in required {
            if self.field(field).trim().is_empty() {
                errors.insert(field, message);
            }
        }

        // Format rules only apply once the field is present; a missing
        // field keeps its "required" message.
        if !self.email.trim().is_empty() && Email::parse(&self.email).is_err() {
            errors.insert(ShippingField::Email, "Please enter a valid email");
        }

        if !self.phone.trim().is_empty() && self.normalized_phone().len() != 10 {
            errors.insert(
                ShippingField::Phone,
                "Please enter a valid 10-digit phone number",
            );
        }

        let pincode_ok =
            self.pincode.len() == 6 && self.pincode.chars().all(|c| c.is_ascii_digit());
        if !self.pincode.trim().is_empty() && !pincode_ok {
            errors.insert(
                ShippingField::Pincode,
                "Please enter a valid 6-digit pincode",
            );
        }

        errors
    }
}

/// Totals shown in the order summary and frozen into the order at
/// placement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutTotals {
    /// Sum of price x quantity over the cart lines.
    pub subtotal: Price,
    /// Flat delivery fee, zero above the free-delivery threshold.
    pub delivery_charge: Price,
    /// `subtotal + delivery_charge`.
    pub total: Price,
    /// Amount still needed to reach free delivery, when below the
    /// threshold.
    pub free_delivery_remainder: Option<Price>,
}

impl CheckoutTotals {
    fn compute(subtotal: Price, config: &StoreConfig) -> Self {
        let delivery_charge = if subtotal > config.free_delivery_threshold {
            Price::ZERO
        } else {
            config.delivery_fee
        };
        let free_delivery_remainder = (subtotal < config.free_delivery_threshold)
            .then(|| config.free_delivery_threshold.saturating_sub(subtotal));
        Self {
            subtotal,
            delivery_charge,
            total: subtotal + delivery_charge,
            free_delivery_remainder,
        }
    }
}

/// Where the checkout machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    CollectingDetails,
    SelectingPayment,
    Placed,
}

/// Checkout operation failures.
///
/// Validation failures and invariant violations are both surfaced as
/// values so the calling layer can observe rejections without the
/// machine ever corrupting its state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// One or more shipping fields failed validation.
    #[error("shipping details invalid ({} field(s))", .0.len())]
    Validation(ValidationErrors),

    /// The order was already placed; the machine never leaves `Placed`.
    #[error("order already placed")]
    AlreadyPlaced,

    /// A placement is currently processing; the trigger was ignored.
    #[error("order placement already in progress")]
    PlacementInFlight,

    /// Placement requires the payment-selection stage.
    #[error("checkout is not at the payment stage")]
    NotAtPayment,

    /// The cart emptied out before placement.
    #[error("cannot place an order with an empty cart")]
    EmptyCart,
}

#[derive(Debug)]
enum Stage {
    Details,
    Payment,
    Placed(OrderId),
}

#[derive(Debug)]
struct FlowState {
    stage: Stage,
    details: ShippingDetails,
    errors: ValidationErrors,
    payment_method: PaymentMethod,
    processing: bool,
}

/// The checkout state machine for one cart.
///
/// Cheaply cloneable handle; clones share the same machine. Create one
/// per checkout attempt via [`crate::Session::begin_checkout`].
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    state: Arc<Mutex<FlowState>>,
    config: StoreConfig,
}

impl CheckoutFlow {
    /// Start a new checkout at the details stage.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(FlowState {
                stage: Stage::Details,
                details: ShippingDetails::default(),
                errors: ValidationErrors::default(),
                payment_method: PaymentMethod::default(),
                processing: false,
            })),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn stage(&self) -> CheckoutStage {
        match self.lock().stage {
            Stage::Details => CheckoutStage::CollectingDetails,
            Stage::Payment => CheckoutStage::SelectingPayment,
            Stage::Placed(_) => CheckoutStage::Placed,
        }
    }

    /// The minted order id, once placed.
    #[must_use]
    pub fn placed_order_id(&self) -> Option<OrderId> {
        match &self.lock().stage {
            Stage::Placed(id) => Some(id.clone()),
            _ => None,
        }
    }

    /// Whether a placement is currently in flight.
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    /// Snapshot of the shipping draft.
    #[must_use]
    pub fn details(&self) -> ShippingDetails {
        self.lock().details.clone()
    }

    /// The validation errors from the last `validate`/transition
    /// attempt, minus any fields edited since.
    #[must_use]
    pub fn errors(&self) -> ValidationErrors {
        self.lock().errors.clone()
    }

    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        self.lock().payment_method
    }

    /// Edit one field of the shipping draft.
    ///
    /// Clears any pending error on that field, mirroring the form
    /// behavior of re-editing a flagged input.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::AlreadyPlaced` after placement; the
    /// draft is frozen into the order.
    pub fn set_field(&self, field: ShippingField, value: &str) -> Result<(), CheckoutError> {
        let mut state = self.lock();
        if matches!(state.stage, Stage::Placed(_)) {
            warn!(?field, "edit rejected: order already placed");
            return Err(CheckoutError::AlreadyPlaced);
        }
        *state.details.field_mut(field) = value.to_owned();
        state.errors.remove(field);
        Ok(())
    }

    /// Run all field rules, store the result for `errors()`, and
    /// return it.
    pub fn validate(&self) -> ValidationErrors {
        let mut state = self.lock();
        let errors = state.details.validate();
        state.errors = errors.clone();
        errors
    }

    /// Advance `CollectingDetails -> SelectingPayment`.
    ///
    /// # Errors
    ///
    /// Returns the full validation error set if any field rule fails;
    /// the machine stays at the details stage. Returns `AlreadyPlaced`
    /// after placement. Already being at the payment stage is fine.
    pub fn continue_to_payment(&self) -> Result<(), CheckoutError> {
        let mut state = self.lock();
        match state.stage {
            Stage::Placed(_) => {
                warn!("transition rejected: order already placed");
                return Err(CheckoutError::AlreadyPlaced);
            }
            Stage::Details | Stage::Payment => {}
        }
        let errors = state.details.validate();
        if errors.is_empty() {
            state.errors = ValidationErrors::default();
            state.stage = Stage::Payment;
            Ok(())
        } else {
            state.errors = errors.clone();
            Err(CheckoutError::Validation(errors))
        }
    }

    /// Return `SelectingPayment -> CollectingDetails`. Always allowed
    /// before placement; no re-validation needed.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::AlreadyPlaced` after placement.
    pub fn back_to_details(&self) -> Result<(), CheckoutError> {
        let mut state = self.lock();
        match state.stage {
            Stage::Placed(_) => {
                warn!("transition rejected: order already placed");
                Err(CheckoutError::AlreadyPlaced)
            }
            Stage::Details | Stage::Payment => {
                state.stage = Stage::Details;
                Ok(())
            }
        }
    }

    /// Choose how to pay. Defaults to cash on delivery.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::AlreadyPlaced` after placement.
    pub fn select_payment(&self, method: PaymentMethod) -> Result<(), CheckoutError> {
        let mut state = self.lock();
        if matches!(state.stage, Stage::Placed(_)) {
            warn!(%method, "payment selection rejected: order already placed");
            return Err(CheckoutError::AlreadyPlaced);
        }
        state.payment_method = method;
        Ok(())
    }

    /// Order-summary totals for the current cart contents.
    #[must_use]
    pub fn totals(&self, cart: &CartStore) -> CheckoutTotals {
        CheckoutTotals::compute(cart.subtotal(), &self.config)
    }

    /// Place the order.
    ///
    /// Validates and snapshots the cart lines, shipping details, and
    /// payment method, suspends for the simulated payment delay, then
    /// exactly once: mints an order id, appends the order to the front
    /// of the history, clears the cart, and enters `Placed`. The order
    /// is built from the pre-delay snapshot, so mutations arriving
    /// while the delay is in flight never leak into it. Further
    /// placement triggers during the delay are rejected with
    /// `PlacementInFlight`.
    ///
    /// # Errors
    ///
    /// - `NotAtPayment` before the payment stage
    /// - `AlreadyPlaced` after placement
    /// - `PlacementInFlight` while a placement is processing
    /// - `Validation` if the shipping details no longer pass (defensive
    ///   re-validation)
    /// - `EmptyCart` if the cart has no lines
    pub async fn place_order(
        &self,
        cart: &CartStore,
        history: &OrderHistory,
    ) -> Result<Order, CheckoutError> {
        let (lines, shipping, payment_method) = {
            let mut state = self.lock();
            match state.stage {
                Stage::Placed(_) => {
                    warn!("placement rejected: order already placed");
                    return Err(CheckoutError::AlreadyPlaced);
                }
                Stage::Details => return Err(CheckoutError::NotAtPayment),
                Stage::Payment => {}
            }
            if state.processing {
                warn!("placement rejected: already in flight");
                return Err(CheckoutError::PlacementInFlight);
            }
            let errors = state.details.validate();
            if !errors.is_empty() {
                state.errors = errors.clone();
                return Err(CheckoutError::Validation(errors));
            }
            let lines = cart.lines();
            if lines.is_empty() {
                return Err(CheckoutError::EmptyCart);
            }
            state.processing = true;
            (lines, state.details.clone(), state.payment_method)
        };

        // Simulated payment gateway; the lock is not held across the
        // suspension, only the `processing` flag guards re-entry. The
        // order is built from the snapshot validated above.
        tokio::time::sleep(self.config.payment_delay).await;

        let subtotal = lines.iter().map(CartLine::line_total).sum();
        let totals = CheckoutTotals::compute(subtotal, &self.config);
        let order = Order {
            id: mint_order_id(),
            lines,
            shipping,
            payment_method,
            total_amount: totals.total,
            order_date: Utc::now(),
            status: OrderStatus::Pending,
        };

        history.append(order.clone());
        cart.clear();

        let mut state = self.lock();
        state.stage = Stage::Placed(order.id.clone());
        state.processing = false;
        info!(order_id = %order.id, total = %order.total_amount, "order placed");

        Ok(order)
    }
}

/// Process-wide placement sequence, folded into order ids so two
/// placements in the same millisecond still get distinct ids.
static ORDER_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Mint an order id: `ORD` + 8-digit millisecond tail + 4-digit
/// sequence.
fn mint_order_id() -> OrderId {
    let millis = Utc::now().timestamp_millis().unsigned_abs();
    let tail = millis % 100_000_000;
    let seq = ORDER_SEQUENCE.fetch_add(1, Ordering::Relaxed) % 10_000;
    OrderId::new(format!("ORD{tail:08}{seq:04}"))
}

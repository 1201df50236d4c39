//! Status and payment-method enums.
//!
//! Order status values are informational labels in the session core:
//! fulfillment-side transitions happen outside it, so there is no
//! transition function here, only the values and their display forms.

use serde::{Deserialize, Serialize};

/// Fulfillment status of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Newly placed, not yet acknowledged by fulfillment.
    #[default]
    Pending,
    /// Acknowledged by fulfillment.
    Confirmed,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Shipped => write!(f, "Shipped"),
            Self::Delivered => write!(f, "Delivered"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// How the shopper chose to pay.
///
/// Payment is simulated - the variant is recorded on the order but no
/// gateway is contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMethod {
    /// Pay when the order arrives.
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,
    /// Credit or debit card.
    #[serde(rename = "card")]
    Card,
    /// Unified Payments Interface.
    #[serde(rename = "upi")]
    Upi,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CashOnDelivery => write!(f, "Cash on Delivery"),
            Self::Card => write!(f, "Credit/Debit Card"),
            Self::Upi => write!(f, "UPI Payment"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::CashOnDelivery),
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_serde_labels() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Delivered).unwrap(),
            "\"delivered\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(parsed, OrderStatus::Shipped);
    }

    #[test]
    fn test_order_status_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "Pending");
        assert_eq!(OrderStatus::Delivered.to_string(), "Delivered");
    }

    #[test]
    fn test_order_status_from_str() {
        assert_eq!("confirmed".parse::<OrderStatus>().unwrap(), OrderStatus::Confirmed);
        assert!("unknown".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_payment_method_serde_tokens() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"cod\""
        );
        let parsed: PaymentMethod = serde_json::from_str("\"upi\"").unwrap();
        assert_eq!(parsed, PaymentMethod::Upi);
    }

    #[test]
    fn test_payment_method_default() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_payment_method_display() {
        assert_eq!(PaymentMethod::Card.to_string(), "Credit/Debit Card");
        assert_eq!(PaymentMethod::Upi.to_string(), "UPI Payment");
    }
}

//! Shopping-cart types.

use serde::{Deserialize, Serialize};

use tetranoma_core::{FigureId, PaymentId, Price};

use super::Order;

/// One line of the cart as computed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(alias = "figure")]
    pub figure_id: FigureId,
    pub quantity: u32,
    #[serde(default, alias = "price")]
    pub unit_price: Price,
}

/// Items and total as one unit. The total is always the server's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub total_price: Price,
}

impl CartSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }
}

/// Response to add/remove: the open order, absent once it has no lines.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartMutation {
    #[serde(default)]
    pub order: Option<CartSnapshot>,
}

/// Response to `GET /cart`: absent when the user has no open cart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartFetch {
    #[serde(default)]
    pub cart: Option<CartSnapshot>,
}

/// Body for `POST /cart/add`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCart {
    pub figure_id: FigureId,
    pub quantity: u32,
}

/// Shipping destination sent with checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// Payment and delivery details for `POST /cart/checkout`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<PaymentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
}

/// Response to checkout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutReceipt {
    #[serde(default)]
    pub order: Option<Order>,
    #[serde(default)]
    pub message: Option<String>,
}

//! Payment-intent types.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use tetranoma_core::{OrderId, PaymentId, PaymentStatus, Price};

/// Body for `POST /stripe/create-payment-intent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntent {
    pub order_id: OrderId,
    pub amount: Price,
}

/// `{clientSecret, paymentId}` response body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentCreated {
    pub client_secret: SecretString,
    pub payment_id: PaymentId,
}

/// Body for `POST /stripe/confirm-payment`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmIntent {
    pub payment_intent_id: PaymentId,
}

/// Response to a confirmation. Shape varies by provider state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One checkout attempt's payment handshake.
///
/// Never persisted. Replaced by the next `create_payment_intent` and dropped
/// by `reset_payment_state`.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// Local id of the checkout attempt this intent belongs to.
    pub attempt_id: Uuid,
    pub client_secret: SecretString,
    pub payment_id: PaymentId,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl PaymentIntent {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// What the hosted payment SDK needs to collect card details.
#[derive(Debug, Clone)]
pub struct PaymentHandle {
    pub publishable_key: String,
    pub client_secret: SecretString,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_intent_created_parses_and_hides_secret() {
        let created: IntentCreated = serde_json::from_value(json!({
            "clientSecret": "pi_1_secret_abc",
            "paymentId": "pay_1"
        }))
        .unwrap();

        assert_eq!(created.client_secret.expose_secret(), "pi_1_secret_abc");
        assert_eq!(created.payment_id, PaymentId::from("pay_1"));
        assert!(!format!("{created:?}").contains("secret_abc"));
    }

    #[test]
    fn test_create_intent_body() {
        let body = CreateIntent {
            order_id: OrderId::from("o1"),
            amount: Price::from_cents(4999),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["orderId"], "o1");
        assert!((value["amount"].as_f64().unwrap() - 49.99).abs() < 1e-9);
    }
}

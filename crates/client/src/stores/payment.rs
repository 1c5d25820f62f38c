//! Payment store: the short-lived intent handshake of one checkout attempt.
//!
//! An intent carries a local attempt id and an expiry. Confirmation is
//! refused without a request when the id is not the held intent's, when the
//! intent has expired, or when it already settled. Status only moves
//! `pending -> completed | failed`.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use tetranoma_core::{OrderId, PaymentId, PaymentStatus, Price};

use crate::config::PaymentConfig;
use crate::error::{PaymentError, add_breadcrumb};
use crate::gateway::{ApiRequest, Gateway, fetch};
use crate::models::{
    ConfirmIntent, CreateIntent, IntentCreated, PaymentConfirmation, PaymentHandle, PaymentIntent,
};
use crate::notify::Notifier;

use super::BusyFlag;

#[derive(Debug, Default)]
struct PaymentState {
    intent: Option<PaymentIntent>,
    error: Option<String>,
}

/// Owns the payment intent of the checkout attempt in progress.
pub struct PaymentStore {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    config: PaymentConfig,
    state: RwLock<PaymentState>,
    busy: BusyFlag,
}

impl PaymentStore {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn Gateway>,
        notifier: Arc<dyn Notifier>,
        config: PaymentConfig,
    ) -> Self {
        Self {
            gateway,
            notifier,
            config,
            state: RwLock::new(PaymentState::default()),
            busy: BusyFlag::default(),
        }
    }

    /// Start a payment for `order_id`. Replaces any previous intent.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the previous intent is kept in that case.
    #[instrument(skip(self), fields(order_id = %order_id, amount = %amount))]
    pub async fn create_payment_intent(
        &self,
        order_id: &OrderId,
        amount: Price,
    ) -> Result<PaymentIntent, PaymentError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::post("/stripe/create-payment-intent").json(&CreateIntent {
            order_id: order_id.clone(),
            amount,
        })?;

        let created = match fetch::<IntentCreated>(self.gateway.as_ref(), request).await {
            Ok(created) => created,
            Err(e) => {
                return Err(self
                    .fail(e.into(), "Failed to create payment intent")
                    .await);
            }
        };

        let created_at = Utc::now();
        let ttl = ChronoDuration::from_std(self.config.intent_ttl)
            .unwrap_or_else(|_| ChronoDuration::seconds(900));
        let intent = PaymentIntent {
            attempt_id: Uuid::new_v4(),
            client_secret: created.client_secret,
            payment_id: created.payment_id,
            status: PaymentStatus::Pending,
            created_at,
            expires_at: created_at + ttl,
        };

        {
            let mut state = self.state.write().await;
            state.intent = Some(intent.clone());
            state.error = None;
        }

        debug!(
            attempt_id = %intent.attempt_id,
            payment_id = %intent.payment_id,
            "Payment intent created"
        );
        add_breadcrumb(
            "payment",
            "Payment intent created",
            Some(&[("payment_id", intent.payment_id.to_string().as_str())]),
        );

        Ok(intent)
    }

    /// Confirm the held intent.
    ///
    /// # Errors
    ///
    /// - `NoActiveIntent`, `StaleIntent`, `Expired` or `AlreadySettled`
    ///   before any request is sent
    /// - the gateway error, after marking the intent `failed`
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn confirm_payment(
        &self,
        payment_id: &PaymentId,
    ) -> Result<PaymentConfirmation, PaymentError> {
        let _busy = self.busy.enter();

        let attempt_id = match self.check_confirmable(payment_id).await {
            Ok(attempt_id) => attempt_id,
            Err(e) => return Err(self.fail(e, "Failed to confirm payment").await),
        };

        let request = ApiRequest::post("/stripe/confirm-payment").json(&ConfirmIntent {
            payment_intent_id: payment_id.clone(),
        })?;

        match fetch::<PaymentConfirmation>(self.gateway.as_ref(), request).await {
            Ok(confirmation) => {
                self.settle(attempt_id, PaymentStatus::Completed).await;
                self.state.write().await.error = None;
                self.notifier.success("Payment completed successfully!");
                add_breadcrumb("payment", "Payment completed", None);
                Ok(confirmation)
            }
            Err(e) => {
                self.settle(attempt_id, PaymentStatus::Failed).await;
                Err(self.fail(e.into(), "Failed to confirm payment").await)
            }
        }
    }

    /// Drop the intent and any error. Call between checkout attempts.
    pub async fn reset_payment_state(&self) {
        let mut state = self.state.write().await;
        state.intent = None;
        state.error = None;
    }

    /// What the hosted payment SDK needs, if a key is configured and an
    /// unsettled intent is held.
    pub async fn payment_handle(&self) -> Option<PaymentHandle> {
        let publishable_key = self.config.publishable_key.clone()?;
        let state = self.state.read().await;
        let intent = state.intent.as_ref().filter(|i| !i.status.is_settled())?;

        Some(PaymentHandle {
            publishable_key,
            client_secret: intent.client_secret.clone(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub async fn intent(&self) -> Option<PaymentIntent> {
        self.state.read().await.intent.clone()
    }

    pub async fn status(&self) -> Option<PaymentStatus> {
        self.state.read().await.intent.as_ref().map(|i| i.status)
    }

    /// Message of the last failed action, cleared by the next success.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.busy.is_busy()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn check_confirmable(&self, payment_id: &PaymentId) -> Result<Uuid, PaymentError> {
        let state = self.state.read().await;
        let intent = state.intent.as_ref().ok_or(PaymentError::NoActiveIntent)?;

        if intent.payment_id != *payment_id {
            return Err(PaymentError::StaleIntent {
                expected: intent.payment_id.clone(),
                received: payment_id.clone(),
            });
        }
        if intent.status.is_settled() {
            return Err(PaymentError::AlreadySettled(intent.status));
        }
        if intent.is_expired_at(Utc::now()) {
            return Err(PaymentError::Expired);
        }

        Ok(intent.attempt_id)
    }

    /// Move the intent of `attempt_id` to `status`. A no-op if the intent was
    /// reset or replaced while the request was in flight.
    async fn settle(&self, attempt_id: Uuid, status: PaymentStatus) {
        let mut state = self.state.write().await;
        match state.intent.as_mut() {
            Some(intent)
                if intent.attempt_id == attempt_id && intent.status.can_transition_to(status) =>
            {
                intent.status = status;
            }
            _ => debug!(%attempt_id, %status, "Intent changed while confirming; not updated"),
        }
    }

    async fn fail(&self, error: PaymentError, fallback: &str) -> PaymentError {
        let message = error.user_message(fallback);
        warn!(error = %error, "{fallback}");
        self.state.write().await.error = Some(message.clone());
        self.notifier.error(&message);
        error
    }
}

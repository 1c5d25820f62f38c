//! Cart store.
//!
//! The server is the single source of truth: every response replaces items and
//! total together, and nothing is recomputed locally. Overlapping calls each
//! take a ticket; a successful response older than one already applied is
//! discarded. A failed call supersedes nothing.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use tetranoma_core::{FigureId, Price};

use crate::error::add_breadcrumb;
use crate::gateway::{ApiRequest, Gateway, GatewayError, fetch};
use crate::models::{
    AddToCart, CartFetch, CartLine, CartMutation, CartSnapshot, CheckoutDetails, CheckoutReceipt,
};
use crate::notify::Notifier;

use super::{BusyFlag, RequestSequence, Ticket};

/// Header carrying the checkout deduplication key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

#[derive(Debug, Default)]
struct CartState {
    cart: CartSnapshot,
    error: Option<String>,
    /// Key of the checkout attempt in progress; survives failures so a retry
    /// is deduplicated by the server.
    checkout_key: Option<Uuid>,
}

/// Owns the shopping cart.
pub struct CartStore {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<CartState>,
    busy: BusyFlag,
    sequence: RequestSequence,
}

impl CartStore {
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            notifier,
            state: RwLock::new(CartState::default()),
            busy: BusyFlag::default(),
            sequence: RequestSequence::default(),
        }
    }

    /// Add `quantity` of a figure and adopt the server's cart.
    ///
    /// # Errors
    ///
    /// Returns the gateway error (e.g. out of stock).
    #[instrument(skip(self), fields(figure_id = %figure_id))]
    pub async fn add_to_cart(
        &self,
        figure_id: &FigureId,
        quantity: u32,
    ) -> Result<CartSnapshot, GatewayError> {
        let _busy = self.busy.enter();
        let ticket = self.sequence.issue();
        let request = ApiRequest::post("/cart/add").json(&AddToCart {
            figure_id: figure_id.clone(),
            quantity,
        })?;

        match fetch::<CartMutation>(self.gateway.as_ref(), request).await {
            Ok(mutation) => {
                let cart = mutation.order.unwrap_or_default();
                self.apply(ticket, cart.clone(), true).await;
                self.notifier.success("Added to cart successfully!");
                add_breadcrumb(
                    "cart",
                    "Added to cart",
                    Some(&[("figure_id", figure_id.to_string().as_str())]),
                );
                Ok(cart)
            }
            Err(e) => Err(self.fail(ticket, e, "Error adding to cart", true).await),
        }
    }

    /// Load the open cart. An absent cart leaves local state as it is.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Option<CartSnapshot>, GatewayError> {
        let _busy = self.busy.enter();
        let ticket = self.sequence.issue();

        match fetch::<CartFetch>(self.gateway.as_ref(), ApiRequest::get("/cart")).await {
            Ok(fetched) => {
                if let Some(cart) = &fetched.cart {
                    self.apply(ticket, cart.clone(), false).await;
                } else if !self.sequence.is_stale(ticket) {
                    self.state.write().await.error = None;
                }
                Ok(fetched.cart)
            }
            Err(e) => Err(self.fail(ticket, e, "Error retrieving cart", false).await),
        }
    }

    /// Remove a figure's line. If the server returns no open order the cart
    /// becomes empty.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    #[instrument(skip(self), fields(figure_id = %figure_id))]
    pub async fn remove_from_cart(&self, figure_id: &FigureId) -> Result<CartSnapshot, GatewayError> {
        let _busy = self.busy.enter();
        let ticket = self.sequence.issue();
        let request = ApiRequest::delete(format!("/cart/remove/{figure_id}"));

        match fetch::<CartMutation>(self.gateway.as_ref(), request).await {
            Ok(mutation) => {
                let cart = mutation.order.unwrap_or_default();
                self.apply(ticket, cart.clone(), true).await;
                Ok(cart)
            }
            Err(e) => Err(self.fail(ticket, e, "Error removing from cart", true).await),
        }
    }

    /// Place the order for the current cart.
    ///
    /// The request carries an `Idempotency-Key`. The key is minted on the
    /// first attempt, reused by every retry after a failure, and dropped on
    /// success or when the cart changes. On success the cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the cart is kept for a retry.
    #[instrument(skip(self, details))]
    pub async fn checkout(&self, details: &CheckoutDetails) -> Result<CheckoutReceipt, GatewayError> {
        let _busy = self.busy.enter();
        let ticket = self.sequence.issue();

        let key = *self
            .state
            .write()
            .await
            .checkout_key
            .get_or_insert_with(Uuid::new_v4);
        let request = ApiRequest::post("/cart/checkout")
            .header(IDEMPOTENCY_KEY_HEADER, key)
            .json(details)?;

        match fetch::<CheckoutReceipt>(self.gateway.as_ref(), request).await {
            Ok(receipt) => {
                {
                    let mut state = self.state.write().await;
                    if state.checkout_key == Some(key) {
                        state.checkout_key = None;
                    }
                }
                self.apply(ticket, CartSnapshot::default(), false).await;
                self.notifier.success("Order completed successfully!");
                add_breadcrumb("cart", "Checkout completed", None);
                Ok(receipt)
            }
            Err(e) => Err(self.fail(ticket, e, "Error processing checkout", true).await),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Items and total as one consistent copy.
    pub async fn snapshot(&self) -> CartSnapshot {
        self.state.read().await.cart.clone()
    }

    pub async fn items(&self) -> Vec<CartLine> {
        self.state.read().await.cart.items.clone()
    }

    pub async fn total_price(&self) -> Price {
        self.state.read().await.cart.total_price
    }

    /// Message of the last failed action, cleared by the next success.
    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Key the next checkout attempt will reuse, if one is pending.
    pub async fn pending_checkout_key(&self) -> Option<Uuid> {
        self.state.read().await.checkout_key
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.busy.is_busy()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Adopt `cart` unless a newer response has already been adopted.
    ///
    /// `contents_changed` marks add/remove: a different cart is a different
    /// checkout attempt, so the pending key is dropped.
    async fn apply(&self, ticket: Ticket, cart: CartSnapshot, contents_changed: bool) {
        let mut state = self.state.write().await;
        if contents_changed {
            state.checkout_key = None;
        }
        if !self.sequence.claim(ticket) {
            debug!(?ticket, "Discarding superseded cart response");
            return;
        }
        state.cart = cart;
        state.error = None;
    }

    async fn fail(
        &self,
        ticket: Ticket,
        error: GatewayError,
        fallback: &str,
        notify: bool,
    ) -> GatewayError {
        let message = error.user_message(fallback);
        warn!(error = %error, "{fallback}");
        if !self.sequence.is_stale(ticket) {
            self.state.write().await.error = Some(message.clone());
        }
        if notify {
            self.notifier.error(&message);
        }
        error
    }
}

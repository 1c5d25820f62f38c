//! Store contract tests for the Tetranoma client.
//!
//! Every test drives the real stores against a scripted gateway, an
//! in-memory session cache and a recording notifier. No network is used.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tetranoma-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let ctx = TestContext::new();
//! ctx.gateway.respond(Method::Get, "/cart", json!({"cart": {"items": [], "totalPrice": 0}}));
//! ctx.state.cart().get_cart().await.unwrap();
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use tetranoma_client::config::{ClientConfig, PaymentConfig};
use tetranoma_client::gateway::mock::MockGateway;
use tetranoma_client::notify::RecordingNotifier;
use tetranoma_client::session_cache::MemoryCache;
use tetranoma_client::AppState;

pub use tetranoma_client::gateway::{GatewayError, Method};
pub use tetranoma_client::notify::NotificationKind;

/// Fresh application state plus handles to its test doubles.
pub struct TestContext {
    pub state: AppState,
    pub gateway: Arc<MockGateway>,
    pub cache: Arc<MemoryCache>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    /// Context with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Context whose payment intents expire after `ttl`.
    #[must_use]
    pub fn with_intent_ttl(ttl: Duration) -> Self {
        Self::with_config(ClientConfig {
            payment: PaymentConfig {
                publishable_key: Some("pk_test_tetranoma".to_string()),
                intent_ttl: ttl,
            },
            ..ClientConfig::default()
        })
    }

    #[must_use]
    pub fn with_config(config: ClientConfig) -> Self {
        let gateway = Arc::new(MockGateway::new());
        let cache = Arc::new(MemoryCache::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let state = AppState::with_parts(gateway.clone(), cache.clone(), notifier.clone(), config);

        Self {
            state,
            gateway,
            cache,
            notifier,
        }
    }

    /// Error notifications recorded so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.notifier.messages(NotificationKind::Error)
    }

    /// Success notifications recorded so far.
    #[must_use]
    pub fn successes(&self) -> Vec<String> {
        self.notifier.messages(NotificationKind::Success)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// An API error with a server message.
#[must_use]
pub fn api_error(status: u16, message: &str) -> GatewayError {
    GatewayError::Api {
        status,
        message: Some(message.to_string()),
    }
}

/// A failure with no response at all.
#[must_use]
pub fn offline() -> GatewayError {
    GatewayError::Transport("connection refused".to_string())
}

/// `{order: {items, totalPrice}}` body with one line per `(figure, qty, unit)`.
#[must_use]
pub fn order_body(lines: &[(&str, u32, f64)], total: f64) -> Value {
    json!({"order": cart_json(lines, total)})
}

/// `{cart: {items, totalPrice}}` body.
#[must_use]
pub fn cart_body(lines: &[(&str, u32, f64)], total: f64) -> Value {
    json!({"cart": cart_json(lines, total)})
}

fn cart_json(lines: &[(&str, u32, f64)], total: f64) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(figure, quantity, unit)| {
            json!({"figureId": figure, "quantity": quantity, "unitPrice": unit})
        })
        .collect();
    json!({"items": items, "totalPrice": total})
}

/// A figure record as the API returns it.
#[must_use]
pub fn figure_json(id: &str, title: &str, favorites: &[&str]) -> Value {
    json!({
        "_id": id,
        "title": title,
        "category": "anime",
        "price": 120,
        "rating": 4.5,
        "favorites": favorites,
    })
}

/// `{figures, pagination}` body.
#[must_use]
pub fn figures_body(figures: Vec<Value>, current_page: u32, total_pages: u32) -> Value {
    let total_items = figures.len();
    json!({
        "figures": figures,
        "pagination": {
            "currentPage": current_page,
            "totalPages": total_pages,
            "totalItems": total_items,
            "itemsPerPage": 12,
        }
    })
}

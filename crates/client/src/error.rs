//! Store-level error types and Sentry helpers.
//!
//! Every store action returns the failure that caused it. Cart, catalog and
//! admin actions fail only with a [`GatewayError`]; the auth store can also
//! fail on the session cache, and the payment store rejects stale intents
//! before any request is sent.

use thiserror::Error;

use tetranoma_core::{PaymentId, PaymentStatus};

use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::session_cache::CacheError;

/// Auth store failure.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The API call failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The session cache could not be read or written.
    #[error("Session cache error: {0}")]
    Cache(#[from] CacheError),
}

impl AuthError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Gateway(err) => err.user_message(fallback),
            Self::Cache(_) => fallback.to_string(),
        }
    }

    /// Returns `true` if the server rejected the session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Gateway(err) if err.is_unauthorized())
    }
}

/// Payment store failure.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// `confirm_payment` was called without a created intent.
    #[error("No active payment intent")]
    NoActiveIntent,

    /// The id to confirm is not the one of the held intent.
    #[error("Payment intent {received} is stale; the active intent is {expected}")]
    StaleIntent {
        expected: PaymentId,
        received: PaymentId,
    },

    /// The held intent outlived its time-to-live.
    #[error("Payment intent has expired")]
    Expired,

    /// The held intent already reached a final status.
    #[error("Payment intent is already {0}")]
    AlreadySettled(PaymentStatus),
}

impl PaymentError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Gateway(err) => err.user_message(fallback),
            other => other.to_string(),
        }
    }
}

/// Any failure a front end can run into.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error("Session cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Set the Sentry user context.
///
/// Called after a successful sign-in or session restore so reported errors
/// are associated with the user.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for a store action.
///
/// Breadcrumbs appear in Sentry reports to show the trail of actions leading
/// up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("figure_id", "f1")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_prefers_server_message() {
        let err = AuthError::from(GatewayError::Api {
            status: 401,
            message: Some("Invalid credentials".to_string()),
        });
        assert_eq!(err.user_message("Error signing in"), "Invalid credentials");
        assert!(err.is_unauthorized());

        let err = AuthError::from(GatewayError::Transport("offline".to_string()));
        assert_eq!(err.user_message("Error signing in"), "Error signing in");
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_payment_error_display() {
        let err = PaymentError::StaleIntent {
            expected: PaymentId::from("pay_2"),
            received: PaymentId::from("pay_1"),
        };
        assert_eq!(
            err.to_string(),
            "Payment intent pay_1 is stale; the active intent is pay_2"
        );
        assert_eq!(
            PaymentError::AlreadySettled(PaymentStatus::Completed).to_string(),
            "Payment intent is already completed"
        );
    }

    #[test]
    fn test_breadcrumb_without_sentry_is_noop() {
        add_breadcrumb("auth", "Signed in", Some(&[("user_id", "u1")]));
        clear_sentry_user();
    }
}

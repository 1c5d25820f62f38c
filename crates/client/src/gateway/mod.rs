//! Outbound channel to the marketplace REST API.
//!
//! # Architecture
//!
//! - Every store talks to the API through the [`Gateway`] trait only
//! - [`HttpGateway`] is the production implementation (`reqwest`, cookie
//!   credentials kept by [`CacheCookieJar`], JSON bodies, configured timeout)
//! - `mock::MockGateway` scripts responses for tests (feature `test-util`)
//!
//! Responses are returned as raw JSON; [`fetch`] decodes them into the
//! envelope type each endpoint documents (`{user}`, `{cart}`, `{figures, pagination}`...).

mod cookies;
mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use cookies::CacheCookieJar;
pub use http::HttpGateway;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Errors surfaced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No response was received (offline, DNS, timeout, connection reset).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("API error: {status}{}", format_api_message(.message.as_deref()))]
    Api {
        status: u16,
        /// The `message` field of the error body, if the server sent one.
        message: Option<String>,
    },

    /// The response body did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The request body could not be serialized.
    #[error("Encode error: {0}")]
    Encode(String),
}

fn format_api_message(message: Option<&str>) -> String {
    message.map_or_else(String::new, |m| format!(" - {m}"))
}

impl GatewayError {
    /// HTTP status for `Api` errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the server rejected the session (401).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status: 401, .. })
    }

    /// The server-provided message if there is one, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single call to the API: method, path relative to the base URL, optional
/// JSON body, query parameters and extra headers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter only if a value is present.
    #[must_use]
    pub fn param_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Append a request header.
    #[must_use]
    pub fn header(mut self, key: &str, value: impl ToString) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Encode` if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, GatewayError> {
        let value = serde_json::to_value(body).map_err(|e| GatewayError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Look up a query parameter by name.
    #[must_use]
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a header by name (case-insensitive).
    #[must_use]
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Single outbound channel to the marketplace API.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Send one request and return the decoded JSON body of a 2xx response.
    async fn send(&self, request: ApiRequest) -> Result<Value, GatewayError>;
}

/// Send `request` and decode the response body into `T`.
///
/// # Errors
///
/// Returns the gateway's error, or `GatewayError::Decode` if the body does not
/// match `T`.
pub async fn fetch<T: DeserializeOwned>(
    gateway: &dyn Gateway,
    request: ApiRequest,
) -> Result<T, GatewayError> {
    let data = gateway.send(request).await?;
    serde_json::from_value(data).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Pull the `message` field out of an error body, if it is JSON and has one.
fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(ToString::to_string)
}

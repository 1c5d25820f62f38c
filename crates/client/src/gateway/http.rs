//! `reqwest`-backed gateway.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{ApiRequest, CacheCookieJar, Gateway, GatewayError, Method, extract_message};
use crate::config::ApiConfig;
use crate::session_cache::SessionCache;

/// HTTP client for the marketplace API.
///
/// Cookies set by the API (the session credential) are kept in the session
/// cache and sent with every request, so a restarted process resumes the
/// session.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<HttpGatewayInner>,
}

struct HttpGatewayInner {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a new gateway for the configured API.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig, cookies: Arc<dyn SessionCache>) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::new(CacheCookieJar::new(cookies)))
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let base_url = config.base_url.as_str().trim_end_matches('/').to_string();
        debug!(base_url = %base_url, "API gateway created");

        Ok(Self {
            inner: Arc::new(HttpGatewayInner { client, base_url }),
        })
    }

    /// Base URL joined with the request path, plus query parameters.
    fn url_for(&self, request: &ApiRequest) -> Result<Url, GatewayError> {
        let path = request.path.trim_start_matches('/');
        let mut url = Url::parse(&format!("{}/{path}", self.inner.base_url))
            .map_err(|e| GatewayError::Encode(format!("invalid request URL: {e}")))?;

        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .params
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }

        Ok(url)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
        }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        let url = self.url_for(&request)?;

        let mut builder = self.inner.client.request(request.method.into(), url);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "API request failed without a response");
            GatewayError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: extract_message(&body),
            });
        }

        debug!(status = %status, bytes = body.len(), "API response received");

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            GatewayError::Decode(e.to_string())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session_cache::MemoryCache;

    fn gateway(base: &str) -> HttpGateway {
        HttpGateway::new(
            &ApiConfig {
                base_url: Url::parse(base).unwrap(),
                timeout: Duration::from_secs(5),
            },
            Arc::new(MemoryCache::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_url_keeps_base_path() {
        let gw = gateway("http://localhost:5000/api");
        let url = gw.url_for(&ApiRequest::get("/cart")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/cart");
    }

    #[test]
    fn test_url_with_trailing_slash_base() {
        let gw = gateway("http://localhost:5000/api/");
        let url = gw.url_for(&ApiRequest::get("/profile")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/profile");
    }

    #[test]
    fn test_url_encodes_params() {
        let gw = gateway("http://localhost:5000/api");
        let request = ApiRequest::get("/figures")
            .param("page", 1)
            .param("title", "Rei Ayanami");
        let url = gw.url_for(&request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/figures?page=1&title=Rei+Ayanami"
        );
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(reqwest::Method::from(Method::Delete), reqwest::Method::DELETE);
        assert_eq!(reqwest::Method::from(Method::Put), reqwest::Method::PUT);
    }
}

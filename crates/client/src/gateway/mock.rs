//! Scripted gateway for tests.
//!
//! Responses are queued per `(method, path)` and handed out first-in,
//! first-out. Every request is recorded so tests can assert on what was sent.
//!
//! ```rust,ignore
//! let gateway = MockGateway::new();
//! gateway.respond(Method::Get, "/cart", json!({"cart": {"items": [], "totalPrice": 0}}));
//! gateway.fail(Method::Post, "/auth/sign-out", GatewayError::Transport("offline".into()));
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use super::{ApiRequest, Gateway, GatewayError, Method};

/// A queued response.
struct Scripted {
    result: Result<Value, GatewayError>,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct MockState {
    scripted: HashMap<(Method, String), VecDeque<Scripted>>,
    requests: Vec<ApiRequest>,
}

/// Holds a gated response back until [`Gate::open`] is called (or the gate is dropped).
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    /// Release the held response.
    pub fn open(self) {
        let _ = self.0.send(());
    }
}

/// In-memory [`Gateway`] returning scripted responses.
#[derive(Default)]
pub struct MockGateway {
    state: Mutex<MockState>,
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        self.lock()
            .scripted
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
    }

    /// Queue a successful response body.
    pub fn respond(&self, method: Method, path: &str, data: Value) {
        self.push(
            method,
            path,
            Scripted {
                result: Ok(data),
                gate: None,
            },
        );
    }

    /// Queue a failure.
    pub fn fail(&self, method: Method, path: &str, error: GatewayError) {
        self.push(
            method,
            path,
            Scripted {
                result: Err(error),
                gate: None,
            },
        );
    }

    /// Queue a result that is only delivered once the returned gate opens.
    #[must_use]
    pub fn respond_gated(
        &self,
        method: Method,
        path: &str,
        result: Result<Value, GatewayError>,
    ) -> Gate {
        let (tx, rx) = oneshot::channel();
        self.push(
            method,
            path,
            Scripted {
                result,
                gate: Some(rx),
            },
        );
        Gate(tx)
    }

    /// All requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// The most recent request sent to `(method, path)`.
    #[must_use]
    pub fn last_request(&self, method: Method, path: &str) -> Option<ApiRequest> {
        self.lock()
            .requests
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .cloned()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn send(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        let key = (request.method, request.path.clone());
        let scripted = {
            let mut state = self.lock();
            state.requests.push(request);
            state.scripted.get_mut(&key).and_then(VecDeque::pop_front)
        };

        let Some(scripted) = scripted else {
            return Err(GatewayError::Transport(format!(
                "no scripted response for {} {}",
                key.0, key.1
            )));
        };

        if let Some(gate) = scripted.gate {
            // A dropped gate releases the response too.
            let _ = gate.await;
        }

        scripted.result
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_responses_are_fifo_per_route() {
        let gateway = MockGateway::new();
        gateway.respond(Method::Get, "/cart", json!({"n": 1}));
        gateway.respond(Method::Get, "/cart", json!({"n": 2}));

        let first = gateway.send(ApiRequest::get("/cart")).await.unwrap();
        let second = gateway.send(ApiRequest::get("/cart")).await.unwrap();

        assert_eq!(first["n"], 1);
        assert_eq!(second["n"], 2);
        assert_eq!(gateway.request_count(), 2);
    }

    #[tokio::test]
    async fn test_unscripted_route_is_transport_error() {
        let gateway = MockGateway::new();
        let err = gateway.send(ApiRequest::get("/nowhere")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
        assert_eq!(gateway.request_count(), 1);
    }

    #[tokio::test]
    async fn test_gated_response_waits_for_open() {
        let gateway = MockGateway::new();
        let gate = gateway.respond_gated(Method::Get, "/figures", Ok(json!({"slow": true})));

        let (result, ()) = tokio::join!(gateway.send(ApiRequest::get("/figures")), async {
            tokio::task::yield_now().await;
            gate.open();
        });

        assert_eq!(result.unwrap()["slow"], true);
    }
}

//! Cart store: server totals, superseded responses and checkout keys.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use uuid::Uuid;

use tetranoma_client::models::CheckoutDetails;
use tetranoma_core::{FigureId, PaymentId, Price};
use tetranoma_integration_tests::{
    Method, TestContext, api_error, cart_body, offline, order_body,
};

fn price(text: &str) -> Price {
    Price::parse(text).unwrap()
}

#[tokio::test]
async fn test_total_is_always_the_last_response_total() {
    let ctx = TestContext::new();
    // The server applies a discount the client knows nothing about.
    ctx.gateway.respond(
        Method::Post,
        "/cart/add",
        order_body(&[("f1", 2, 50.0)], 100.0),
    );
    ctx.gateway.respond(
        Method::Post,
        "/cart/add",
        order_body(&[("f1", 2, 50.0), ("f2", 1, 30.0)], 117.0),
    );
    ctx.gateway.respond(
        Method::Delete,
        "/cart/remove/f1",
        order_body(&[("f2", 1, 30.0)], 27.5),
    );

    let cart = ctx.state.cart();
    cart.add_to_cart(&FigureId::from("f1"), 2).await.unwrap();
    assert_eq!(cart.total_price().await, price("100"));

    cart.add_to_cart(&FigureId::from("f2"), 1).await.unwrap();
    assert_eq!(cart.total_price().await, price("117"));

    cart.remove_from_cart(&FigureId::from("f1")).await.unwrap();
    let snapshot = cart.snapshot().await;
    assert_eq!(snapshot.total_price, price("27.5"));
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].figure_id, FigureId::from("f2"));

    assert_eq!(ctx.successes(), vec!["Added to cart successfully!"; 2]);
}

#[tokio::test]
async fn test_add_request_body_and_failure_notification() {
    let ctx = TestContext::new();
    ctx.gateway
        .fail(Method::Post, "/cart/add", api_error(400, "Only 1 left in stock"));

    let err = ctx
        .state
        .cart()
        .add_to_cart(&FigureId::from("f1"), 3)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(ctx.errors(), vec!["Only 1 left in stock"]);
    assert_eq!(
        ctx.state.cart().error().await.as_deref(),
        Some("Only 1 left in stock")
    );
    assert!(ctx.state.cart().snapshot().await.is_empty());

    let request = ctx.gateway.last_request(Method::Post, "/cart/add").unwrap();
    assert_eq!(request.body.unwrap(), json!({"figureId": "f1", "quantity": 3}));
}

#[tokio::test]
async fn test_superseded_response_is_discarded() {
    let ctx = TestContext::new();
    let slow = ctx.gateway.respond_gated(
        Method::Post,
        "/cart/add",
        Ok(order_body(&[("f1", 1, 10.0)], 10.0)),
    );
    ctx.gateway.respond(
        Method::Post,
        "/cart/add",
        order_body(&[("f1", 1, 10.0), ("f2", 1, 20.0)], 30.0),
    );

    let cart = ctx.state.cart();
    let first = FigureId::from("f1");
    let second = FigureId::from("f2");

    let (older, newer) = tokio::join!(cart.add_to_cart(&first, 1), async {
        // Let the first request reach the gateway before the second is issued.
        tokio::task::yield_now().await;
        let result = cart.add_to_cart(&second, 1).await;
        slow.open();
        result
    });

    // Both callers get their own response...
    assert_eq!(older.unwrap().total_price, price("10"));
    assert_eq!(newer.unwrap().total_price, price("30"));
    // ...but state follows the newest request, not the last to arrive.
    assert_eq!(cart.total_price().await, price("30"));
    assert_eq!(cart.items().await.len(), 2);
    assert!(!cart.is_loading());
}

#[tokio::test]
async fn test_older_success_is_kept_when_newer_request_fails() {
    let ctx = TestContext::new();
    let slow = ctx.gateway.respond_gated(
        Method::Post,
        "/cart/add",
        Ok(order_body(&[("f1", 1, 10.0)], 10.0)),
    );
    ctx.gateway
        .fail(Method::Post, "/cart/add", api_error(409, "Out of stock"));

    let cart = ctx.state.cart();
    let first = FigureId::from("f1");
    let second = FigureId::from("f2");

    let (older, newer) = tokio::join!(cart.add_to_cart(&first, 1), async {
        tokio::task::yield_now().await;
        let result = cart.add_to_cart(&second, 1).await;
        slow.open();
        result
    });

    assert!(older.is_ok());
    assert!(newer.is_err());
    // The only cart the server produced is the one shown.
    assert_eq!(cart.total_price().await, price("10"));
    assert_eq!(cart.items().await.len(), 1);
    assert!(cart.error().await.is_none());
}

#[tokio::test]
async fn test_get_cart_replaces_only_when_present() {
    let ctx = TestContext::new();
    ctx.gateway
        .respond(Method::Get, "/cart", cart_body(&[("f9", 3, 15.0)], 45.0));
    ctx.gateway.respond(Method::Get, "/cart", json!({"cart": null}));

    let cart = ctx.state.cart();
    assert!(cart.get_cart().await.unwrap().is_some());
    assert_eq!(cart.total_price().await, price("45"));

    assert!(cart.get_cart().await.unwrap().is_none());
    assert_eq!(cart.total_price().await, price("45"));
    // Reads do not notify.
    assert!(ctx.notifier.all().is_empty());
}

#[tokio::test]
async fn test_checkout_retry_reuses_idempotency_key() {
    let ctx = TestContext::new();
    ctx.gateway
        .respond(Method::Post, "/cart/add", order_body(&[("f1", 1, 80.0)], 80.0));
    ctx.gateway.fail(Method::Post, "/cart/checkout", offline());
    ctx.gateway.respond(
        Method::Post,
        "/cart/checkout",
        json!({"order": {"_id": "o1", "items": [], "totalPrice": 80, "status": "processing"}}),
    );

    let cart = ctx.state.cart();
    cart.add_to_cart(&FigureId::from("f1"), 1).await.unwrap();

    let details = CheckoutDetails {
        payment_id: Some(PaymentId::from("pi_1")),
        shipping_address: None,
    };
    assert!(cart.checkout(&details).await.is_err());
    // The failed attempt keeps the cart and the key.
    assert_eq!(cart.total_price().await, price("80"));
    let pending = cart.pending_checkout_key().await.unwrap();

    let receipt = cart.checkout(&details).await.unwrap();
    assert!(receipt.order.is_some());

    let keys: Vec<Uuid> = ctx
        .gateway
        .requests()
        .iter()
        .filter(|r| r.path == "/cart/checkout")
        .map(|r| r.header_value("Idempotency-Key").unwrap().parse().unwrap())
        .collect();
    assert_eq!(keys, vec![pending, pending]);

    // Success empties the cart and retires the key.
    assert!(cart.snapshot().await.is_empty());
    assert_eq!(cart.total_price().await, Price::ZERO);
    assert!(cart.pending_checkout_key().await.is_none());
    assert_eq!(ctx.errors(), vec!["Error processing checkout"]);
    assert!(ctx.successes().contains(&"Order completed successfully!".to_string()));
}

#[tokio::test]
async fn test_changing_the_cart_starts_a_new_checkout_attempt() {
    let ctx = TestContext::new();
    ctx.gateway.fail(Method::Post, "/cart/checkout", offline());
    ctx.gateway
        .respond(Method::Post, "/cart/add", order_body(&[("f1", 1, 80.0)], 80.0));

    let cart = ctx.state.cart();
    assert!(cart.checkout(&CheckoutDetails::default()).await.is_err());
    assert!(cart.pending_checkout_key().await.is_some());

    cart.add_to_cart(&FigureId::from("f1"), 1).await.unwrap();
    assert!(cart.pending_checkout_key().await.is_none());
}

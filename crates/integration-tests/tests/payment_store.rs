//! Payment store: intent lifecycle and confirmation guards.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use secrecy::ExposeSecret;
use serde_json::json;

use tetranoma_client::error::PaymentError;
use tetranoma_core::{OrderId, PaymentId, PaymentStatus, Price};
use tetranoma_integration_tests::{Method, TestContext, api_error};

const CREATE: &str = "/stripe/create-payment-intent";
const CONFIRM: &str = "/stripe/confirm-payment";

fn script_intent(ctx: &TestContext, payment_id: &str) {
    ctx.gateway.respond(
        Method::Post,
        CREATE,
        json!({"clientSecret": format!("{payment_id}_secret"), "paymentId": payment_id}),
    );
}

async fn with_intent(payment_id: &str) -> TestContext {
    let ctx = TestContext::with_intent_ttl(Duration::from_secs(900));
    script_intent(&ctx, payment_id);
    ctx.state
        .payment()
        .create_payment_intent(&OrderId::from("o1"), Price::from_cents(12_050))
        .await
        .unwrap();
    ctx
}

#[tokio::test]
async fn test_create_sends_order_and_amount() {
    let ctx = with_intent("pi_1").await;

    let request = ctx.gateway.last_request(Method::Post, CREATE).unwrap();
    assert_eq!(request.body.unwrap(), json!({"orderId": "o1", "amount": 120.5}));

    let intent = ctx.state.payment().intent().await.unwrap();
    assert_eq!(intent.payment_id, PaymentId::from("pi_1"));
    assert_eq!(intent.status, PaymentStatus::Pending);
    assert_eq!(intent.client_secret.expose_secret(), "pi_1_secret");
    assert!(intent.expires_at > intent.created_at);
}

#[tokio::test]
async fn test_confirm_completes_and_notifies() {
    let ctx = with_intent("pi_1").await;
    ctx.gateway
        .respond(Method::Post, CONFIRM, json!({"message": "Payment succeeded"}));

    let confirmation = ctx
        .state
        .payment()
        .confirm_payment(&PaymentId::from("pi_1"))
        .await
        .unwrap();

    assert_eq!(confirmation.message.as_deref(), Some("Payment succeeded"));
    assert_eq!(
        ctx.gateway.last_request(Method::Post, CONFIRM).unwrap().body.unwrap(),
        json!({"paymentIntentId": "pi_1"})
    );
    assert_eq!(ctx.state.payment().status().await, Some(PaymentStatus::Completed));
    assert_eq!(ctx.successes(), vec!["Payment completed successfully!"]);
    assert!(ctx.state.payment().error().await.is_none());
}

#[tokio::test]
async fn test_stale_payment_id_is_rejected_without_a_request() {
    let ctx = with_intent("pi_2").await;
    let before = ctx.gateway.request_count();

    let err = ctx
        .state
        .payment()
        .confirm_payment(&PaymentId::from("pi_1"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PaymentError::StaleIntent { ref expected, ref received }
            if *expected == PaymentId::from("pi_2") && *received == PaymentId::from("pi_1")
    ));
    assert_eq!(ctx.gateway.request_count(), before);
    assert_eq!(ctx.state.payment().status().await, Some(PaymentStatus::Pending));
}

#[tokio::test]
async fn test_expired_intent_is_rejected_without_a_request() {
    let ctx = TestContext::with_intent_ttl(Duration::ZERO);
    script_intent(&ctx, "pi_1");
    let payment = ctx.state.payment();
    payment
        .create_payment_intent(&OrderId::from("o1"), Price::from_cents(1000))
        .await
        .unwrap();

    let err = payment
        .confirm_payment(&PaymentId::from("pi_1"))
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::Expired));
    assert_eq!(ctx.gateway.request_count(), 1);
    assert_eq!(payment.error().await.as_deref(), Some("Payment intent has expired"));
}

#[tokio::test]
async fn test_settled_intent_cannot_be_confirmed_again() {
    let ctx = with_intent("pi_1").await;
    ctx.gateway.respond(Method::Post, CONFIRM, json!({}));
    let payment = ctx.state.payment();

    payment.confirm_payment(&PaymentId::from("pi_1")).await.unwrap();
    let err = payment
        .confirm_payment(&PaymentId::from("pi_1"))
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::AlreadySettled(PaymentStatus::Completed)));
    assert_eq!(ctx.gateway.request_count(), 2);
}

#[tokio::test]
async fn test_failed_confirmation_never_returns_to_pending() {
    let ctx = with_intent("pi_1").await;
    ctx.gateway
        .fail(Method::Post, CONFIRM, api_error(402, "Your card was declined"));
    let payment = ctx.state.payment();

    assert!(payment.confirm_payment(&PaymentId::from("pi_1")).await.is_err());
    assert_eq!(payment.status().await, Some(PaymentStatus::Failed));
    assert_eq!(payment.error().await.as_deref(), Some("Your card was declined"));
    assert_eq!(ctx.errors(), vec!["Your card was declined"]);

    // Retrying needs a fresh intent.
    let err = payment
        .confirm_payment(&PaymentId::from("pi_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::AlreadySettled(PaymentStatus::Failed)));
    assert!(payment.payment_handle().await.is_none());
}

#[tokio::test]
async fn test_new_intent_replaces_the_settled_one() {
    let ctx = with_intent("pi_1").await;
    ctx.gateway
        .fail(Method::Post, CONFIRM, api_error(402, "Your card was declined"));
    let payment = ctx.state.payment();
    let first = payment.intent().await.unwrap();
    assert!(payment.confirm_payment(&PaymentId::from("pi_1")).await.is_err());

    script_intent(&ctx, "pi_2");
    let second = payment
        .create_payment_intent(&OrderId::from("o1"), Price::from_cents(12_050))
        .await
        .unwrap();

    assert_ne!(first.attempt_id, second.attempt_id);
    assert_eq!(payment.status().await, Some(PaymentStatus::Pending));
    assert!(payment.error().await.is_none());
    let handle = payment.payment_handle().await.unwrap();
    assert_eq!(handle.publishable_key, "pk_test_tetranoma");
    assert_eq!(handle.client_secret.expose_secret(), "pi_2_secret");
}

#[tokio::test]
async fn test_failed_create_keeps_previous_intent() {
    let ctx = with_intent("pi_1").await;
    ctx.gateway.fail(Method::Post, CREATE, api_error(400, "Order not found"));
    let payment = ctx.state.payment();

    assert!(
        payment
            .create_payment_intent(&OrderId::from("o2"), Price::from_cents(500))
            .await
            .is_err()
    );

    assert_eq!(payment.intent().await.unwrap().payment_id, PaymentId::from("pi_1"));
    assert_eq!(ctx.errors(), vec!["Order not found"]);
}

#[tokio::test]
async fn test_reset_clears_intent_and_error() {
    let ctx = with_intent("pi_1").await;
    let payment = ctx.state.payment();
    assert!(payment.confirm_payment(&PaymentId::from("pi_9")).await.is_err());
    assert!(payment.error().await.is_some());

    payment.reset_payment_state().await;

    assert!(payment.intent().await.is_none());
    assert!(payment.error().await.is_none());
    let err = payment
        .confirm_payment(&PaymentId::from("pi_1"))
        .await
        .unwrap_err();
    assert!(matches!(err, PaymentError::NoActiveIntent));
}

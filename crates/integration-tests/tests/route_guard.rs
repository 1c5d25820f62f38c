//! Route guard decisions against the cached session.

use tetranoma_client::guard::{GuardDecision, RedirectTarget, RouteMeta};
use tetranoma_client::session_cache::{SessionCache, keys};
use tetranoma_integration_tests::TestContext;

const HOME: GuardDecision = GuardDecision::Redirect(RedirectTarget::Home);
const SIGN_IN: GuardDecision = GuardDecision::Redirect(RedirectTarget::SignIn);

fn cache_session(ctx: &TestContext, role: &str) {
    let user = format!(r#"{{"id":"u1","email":"a@b.com","role":"{role}"}}"#);
    ctx.cache.set(keys::USER, &user).ok();
    ctx.cache.set(keys::IS_AUTHENTICATED, "true").ok();
}

#[tokio::test]
async fn test_signed_out_visitor() {
    let ctx = TestContext::new();
    let guard = ctx.state.guard();

    assert_eq!(guard.check(&RouteMeta::public()).await, GuardDecision::Proceed);
    assert_eq!(guard.check(&RouteMeta::guest()).await, GuardDecision::Proceed);
    assert_eq!(guard.check(&RouteMeta::authenticated()).await, SIGN_IN);
    // The admin check runs first.
    assert_eq!(guard.check(&RouteMeta::admin()).await, HOME);
    assert_eq!(ctx.gateway.request_count(), 0);
}

#[tokio::test]
async fn test_signed_in_user() {
    let ctx = TestContext::new();
    cache_session(&ctx, "user");
    let guard = ctx.state.guard();

    assert_eq!(guard.check(&RouteMeta::authenticated()).await, GuardDecision::Proceed);
    assert_eq!(guard.check(&RouteMeta::guest()).await, HOME);
    assert_eq!(guard.check(&RouteMeta::admin()).await, HOME);
    assert_eq!(ctx.gateway.request_count(), 0);
}

#[tokio::test]
async fn test_signed_in_admin() {
    let ctx = TestContext::new();
    cache_session(&ctx, "admin");
    let guard = ctx.state.guard();

    assert_eq!(guard.check(&RouteMeta::admin()).await, GuardDecision::Proceed);
    assert_eq!(guard.check(&RouteMeta::authenticated()).await, GuardDecision::Proceed);
    assert_eq!(guard.check(&RouteMeta::guest()).await, HOME);
}

#[tokio::test]
async fn test_every_check_rereads_the_cache() {
    let ctx = TestContext::new();
    cache_session(&ctx, "admin");
    let guard = ctx.state.guard();
    assert_eq!(guard.check(&RouteMeta::admin()).await, GuardDecision::Proceed);

    // Signed out elsewhere: the next navigation sees it.
    ctx.cache.remove(keys::IS_AUTHENTICATED).ok();

    assert_eq!(guard.check(&RouteMeta::authenticated()).await, SIGN_IN);
    assert!(!ctx.state.auth().is_authenticated().await);
}

#[tokio::test]
async fn test_unreadable_cached_user_counts_as_signed_out() {
    let ctx = TestContext::new();
    ctx.cache.set(keys::USER, "not json").ok();
    ctx.cache.set(keys::IS_AUTHENTICATED, "true").ok();

    assert_eq!(
        ctx.state.guard().check(&RouteMeta::authenticated()).await,
        SIGN_IN
    );
    assert_eq!(ctx.cache.get(keys::IS_AUTHENTICATED).ok().flatten(), None);
}

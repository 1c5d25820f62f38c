//! Auth store: the session and its mirror in the session cache.
//!
//! # Consistency rules
//!
//! - `is_authenticated` is `true` exactly when a user is present
//! - A successful sign-in writes the cache before the in-memory session
//! - Sign-out and profile deletion clear both even when the request fails
//! - [`AuthStore::check_auth`] restores from the cache only and never calls
//!   the server; [`AuthStore::revalidate`] is the explicit server check

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::error::{AuthError, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::gateway::{ApiRequest, Gateway, fetch};
use crate::models::{
    AccountCreated, Credentials, NewAccount, ProfileUpdate, Session, UserEnvelope, UserRecord,
};
use crate::session_cache::{CacheError, SessionCache, keys};

use super::BusyFlag;

#[derive(Debug, Default)]
struct AuthState {
    session: Session,
    error: Option<String>,
}

/// Owns the authenticated session.
pub struct AuthStore {
    gateway: Arc<dyn Gateway>,
    cache: Arc<dyn SessionCache>,
    state: RwLock<AuthState>,
    busy: BusyFlag,
}

impl AuthStore {
    /// Create a signed-out store. Call [`Self::check_auth`] to restore a
    /// cached session.
    #[must_use]
    pub fn new(gateway: Arc<dyn Gateway>, cache: Arc<dyn SessionCache>) -> Self {
        Self {
            gateway,
            cache,
            state: RwLock::new(AuthState::default()),
            busy: BusyFlag::default(),
        }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Register a new account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if registration is rejected.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn create_account(&self, account: &NewAccount) -> Result<AccountCreated, AuthError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::post("/auth/create-account").json(account)?;

        match fetch::<AccountCreated>(self.gateway.as_ref(), request).await {
            Ok(created) => {
                self.state.write().await.error = None;
                Ok(created)
            }
            Err(e) => Err(self.record_failure(e.into(), "Error creating account").await),
        }
    }

    /// Sign in and persist the returned user.
    ///
    /// On failure the session is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns the gateway error if the credentials are rejected, or a cache
    /// error if the session cannot be persisted.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<UserRecord, AuthError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::post("/auth/sign-in").json(credentials)?;

        let user = match fetch::<UserEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => envelope.user,
            Err(e) => return Err(self.record_failure(e.into(), "Error signing in").await),
        };

        if let Err(e) = self.persist_user(&user) {
            return Err(self.record_failure(e, "Error signing in").await);
        }

        {
            let mut state = self.state.write().await;
            state.session = Session::signed_in(user.clone());
            state.error = None;
        }

        let user_id = user.id.to_string();
        set_sentry_user(&user_id, Some(&user.email));
        add_breadcrumb("auth", "Signed in", Some(&[("user_id", user_id.as_str())]));
        debug!(user_id = %user.id, "Signed in");

        Ok(user)
    }

    /// Sign out. Local state is cleared whether or not the server answers.
    ///
    /// # Errors
    ///
    /// Returns the gateway error after local state has been cleared.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let _busy = self.busy.enter();
        let result = self.gateway.send(ApiRequest::post("/auth/sign-out")).await;

        self.clear_session().await;
        add_breadcrumb("auth", "Signed out", None);

        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(self.record_failure(e.into(), "Error signing out").await),
        }
    }

    /// Restore the session from the cache.
    ///
    /// Returns `true` if the cache holds an authenticated session. Never
    /// contacts the server; an absent flag or an unreadable user clears the
    /// session and both cache keys.
    #[instrument(skip(self))]
    pub async fn check_auth(&self) -> bool {
        match self.cache.get(keys::IS_AUTHENTICATED) {
            Ok(Some(_)) => {}
            Ok(None) => {
                self.clear_session().await;
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Session cache unreadable");
                self.clear_session().await;
                return false;
            }
        }

        let cached = self.cache.get(keys::USER).ok().flatten();
        let user = cached.and_then(|json| serde_json::from_str::<UserRecord>(&json).ok());

        let Some(user) = user else {
            warn!("Cached session has no readable user; clearing");
            self.clear_session().await;
            return false;
        };

        set_sentry_user(&user.id, Some(&user.email));
        self.state.write().await.session = Session::signed_in(user);
        true
    }

    /// Restore from the cache, then confirm the session with the server.
    ///
    /// Returns `false` without a request if nothing is cached, and `false`
    /// after clearing the session if the server rejects it.
    ///
    /// # Errors
    ///
    /// Returns any failure other than a rejected session; the cached session
    /// is kept in that case.
    #[instrument(skip(self))]
    pub async fn revalidate(&self) -> Result<bool, AuthError> {
        if !self.check_auth().await {
            return Ok(false);
        }

        match self.get_profile().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_unauthorized() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Fetch the current user's profile and refresh the session.
    ///
    /// A 401 means the server-side session is gone; local state is cleared.
    ///
    /// # Errors
    ///
    /// Returns the gateway or cache error.
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> Result<UserRecord, AuthError> {
        let _busy = self.busy.enter();

        match fetch::<UserEnvelope>(self.gateway.as_ref(), ApiRequest::get("/profile")).await {
            Ok(envelope) => self.replace_user(envelope.user, "Error loading profile").await,
            Err(e) => {
                if e.is_unauthorized() {
                    debug!("Profile request unauthorized; clearing session");
                    self.clear_session().await;
                }
                Err(self.record_failure(e.into(), "Error loading profile").await)
            }
        }
    }

    /// Update the current user's profile.
    ///
    /// # Errors
    ///
    /// Returns the gateway or cache error.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserRecord, AuthError> {
        let _busy = self.busy.enter();
        let request = ApiRequest::put("/profile/update").json(update)?;

        match fetch::<UserEnvelope>(self.gateway.as_ref(), request).await {
            Ok(envelope) => self.replace_user(envelope.user, "Error updating profile").await,
            Err(e) => Err(self.record_failure(e.into(), "Error updating profile").await),
        }
    }

    /// Delete the current account. Local state is cleared regardless.
    ///
    /// # Errors
    ///
    /// Returns the gateway error after local state has been cleared.
    #[instrument(skip(self))]
    pub async fn delete_profile(&self) -> Result<(), AuthError> {
        let _busy = self.busy.enter();
        let result = self
            .gateway
            .send(ApiRequest::delete("/profile/delete"))
            .await;

        self.clear_session().await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => Err(self.record_failure(e.into(), "Error deleting profile").await),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Copy of the current session.
    pub async fn session(&self) -> Session {
        self.state.read().await.session.clone()
    }

    pub async fn current_user(&self) -> Option<UserRecord> {
        self.state.read().await.session.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.session.is_authenticated
    }

    pub async fn is_admin(&self) -> bool {
        self.state
            .read()
            .await
            .session
            .user
            .as_ref()
            .is_some_and(UserRecord::is_admin)
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

    fn persist_user(&self, user: &UserRecord) -> Result<(), AuthError> {
        let json =
            serde_json::to_string(user).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        self.cache.set(keys::USER, &json)?;
        self.cache.set(keys::IS_AUTHENTICATED, "true")?;
        Ok(())
    }

    async fn replace_user(&self, user: UserRecord, fallback: &str) -> Result<UserRecord, AuthError> {
        if let Err(e) = self.persist_user(&user) {
            return Err(self.record_failure(e, fallback).await);
        }

        let mut state = self.state.write().await;
        state.session = Session::signed_in(user.clone());
        state.error = None;
        Ok(user)
    }

    /// Reset the session and drop both cache keys. Cache failures are logged
    /// so the in-memory session is always cleared.
    async fn clear_session(&self) {
        for key in [keys::USER, keys::IS_AUTHENTICATED, keys::COOKIES] {
            if let Err(e) = self.cache.remove(key) {
                warn!(key, error = %e, "Failed to clear session cache");
            }
        }
        self.state.write().await.session = Session::default();
        clear_sentry_user();
    }

    async fn record_failure(&self, error: AuthError, fallback: &str) -> AuthError {
        let message = error.user_message(fallback);
        warn!(error = %error, "{fallback}");
        self.state.write().await.error = Some(message);
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::Method;
    use crate::gateway::mock::MockGateway;
    use crate::session_cache::MemoryCache;

    fn store() -> (Arc<MockGateway>, Arc<MemoryCache>, AuthStore) {
        let gateway = Arc::new(MockGateway::new());
        let cache = Arc::new(MemoryCache::new());
        let store = AuthStore::new(gateway.clone(), cache.clone());
        (gateway, cache, store)
    }

    #[tokio::test]
    async fn test_check_auth_restores_cached_user() {
        let (gateway, cache, store) = store();
        cache.set(keys::IS_AUTHENTICATED, "true").unwrap();
        cache
            .set(keys::USER, r#"{"id":"u1","email":"misato@nerv.jp","role":"admin"}"#)
            .unwrap();

        assert!(store.check_auth().await);
        assert!(store.is_authenticated().await);
        assert!(store.is_admin().await);
        assert_eq!(gateway.request_count(), 0);
    }

    #[tokio::test]
    async fn test_check_auth_with_corrupt_user_clears_everything() {
        let (_, cache, store) = store();
        cache.set(keys::IS_AUTHENTICATED, "true").unwrap();
        cache.set(keys::USER, "{not json").unwrap();

        assert!(!store.check_auth().await);
        assert!(!store.is_authenticated().await);
        assert_eq!(cache.get(keys::IS_AUTHENTICATED).unwrap(), None);
        assert_eq!(cache.get(keys::USER).unwrap(), None);
    }

    #[tokio::test]
    async fn test_failed_sign_in_leaves_session_untouched() {
        let (gateway, cache, store) = store();
        gateway.fail(
            Method::Post,
            "/auth/sign-in",
            crate::gateway::GatewayError::Api {
                status: 401,
                message: Some("Invalid credentials".to_string()),
            },
        );

        let err = store
            .sign_in(&Credentials::new("a@b.com", "wrong"))
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(store.session().await, Session::default());
        assert_eq!(store.error().await.as_deref(), Some("Invalid credentials"));
        assert_eq!(cache.get(keys::IS_AUTHENTICATED).unwrap(), None);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_get_profile_unauthorized_clears_session() {
        let (gateway, cache, store) = store();
        gateway.respond(
            Method::Post,
            "/auth/sign-in",
            json!({"user": {"id": 1, "email": "a@b.com"}}),
        );
        gateway.fail(
            Method::Get,
            "/profile",
            crate::gateway::GatewayError::Api {
                status: 401,
                message: None,
            },
        );

        store.sign_in(&Credentials::new("a@b.com", "x")).await.unwrap();
        assert!(store.get_profile().await.is_err());

        assert!(!store.is_authenticated().await);
        assert_eq!(cache.get(keys::USER).unwrap(), None);
    }
}

//! Application state shared by every front end.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::gateway::{Gateway, HttpGateway};
use crate::guard::RouteGuard;
use crate::notify::{Notifier, TracingNotifier};
use crate::session_cache::{FileCache, SessionCache};
use crate::stores::{AdminStore, AuthStore, CartStore, CatalogStore, PaymentStore};

/// One instance of each store plus the route guard, wired to the same
/// gateway, session cache and notifier.
///
/// Construct once per application session. Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    auth: Arc<AuthStore>,
    cart: CartStore,
    catalog: CatalogStore,
    payment: PaymentStore,
    admin: AdminStore,
    guard: RouteGuard,
}

impl AppState {
    /// Build the production wiring: HTTP gateway, file-backed session cache
    /// at `config.session_file` and log notifications.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the session
    /// file exists but is unreadable.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let cache: Arc<dyn SessionCache> = Arc::new(FileCache::open(&config.session_file)?);
        let gateway = Arc::new(HttpGateway::new(&config.api, cache.clone())?);
        Ok(Self::with_parts(
            gateway,
            cache,
            Arc::new(TracingNotifier),
            config,
        ))
    }

    /// Build from explicit parts. Used by tests and alternative front ends.
    #[must_use]
    pub fn with_parts(
        gateway: Arc<dyn Gateway>,
        cache: Arc<dyn SessionCache>,
        notifier: Arc<dyn Notifier>,
        config: ClientConfig,
    ) -> Self {
        let auth = Arc::new(AuthStore::new(gateway.clone(), cache));
        let guard = RouteGuard::new(auth.clone());

        Self {
            inner: Arc::new(AppStateInner {
                auth,
                cart: CartStore::new(gateway.clone(), notifier.clone()),
                catalog: CatalogStore::new(gateway.clone(), notifier.clone(), config.items_per_page),
                payment: PaymentStore::new(gateway.clone(), notifier.clone(), config.payment.clone()),
                admin: AdminStore::new(gateway, notifier),
                guard,
                config,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn auth(&self) -> &AuthStore {
        &self.inner.auth
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogStore {
        &self.inner.catalog
    }

    #[must_use]
    pub fn payment(&self) -> &PaymentStore {
        &self.inner.payment
    }

    #[must_use]
    pub fn admin(&self) -> &AdminStore {
        &self.inner.admin
    }

    #[must_use]
    pub fn guard(&self) -> &RouteGuard {
        &self.inner.guard
    }
}

//! Route guard: navigation pre-checks against the session.
//!
//! The session is re-read from the cache on every check, never remembered
//! between navigations.
//!
//! # Example
//!
//! ```rust,ignore
//! match state.guard().check(&RouteMeta::admin()).await {
//!     GuardDecision::Proceed => render_dashboard(),
//!     GuardDecision::Redirect(target) => navigate(target.path()),
//! }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::stores::AuthStore;

/// Access annotations of a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub requires_auth: bool,
    pub requires_guest: bool,
    pub requires_admin: bool,
}

impl RouteMeta {
    /// A route anyone may open.
    #[must_use]
    pub const fn public() -> Self {
        Self {
            requires_auth: false,
            requires_guest: false,
            requires_admin: false,
        }
    }

    /// A route for signed-in users.
    #[must_use]
    pub const fn authenticated() -> Self {
        Self {
            requires_auth: true,
            ..Self::public()
        }
    }

    /// A route for signed-out visitors only (sign-in, registration).
    #[must_use]
    pub const fn guest() -> Self {
        Self {
            requires_guest: true,
            ..Self::public()
        }
    }

    /// A back-office route.
    #[must_use]
    pub const fn admin() -> Self {
        Self {
            requires_auth: true,
            requires_admin: true,
            ..Self::public()
        }
    }
}

/// Where a refused navigation is sent instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    Home,
    SignIn,
}

impl RedirectTarget {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::SignIn => "/sign-in",
        }
    }
}

impl std::fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(RedirectTarget),
}

/// Evaluates [`RouteMeta`] against the auth store.
#[derive(Clone)]
pub struct RouteGuard {
    auth: Arc<AuthStore>,
}

impl RouteGuard {
    #[must_use]
    pub const fn new(auth: Arc<AuthStore>) -> Self {
        Self { auth }
    }

    /// Decide whether navigation to a route with `meta` may proceed.
    ///
    /// Checks run in a fixed order: admin, then auth, then guest.
    pub async fn check(&self, meta: &RouteMeta) -> GuardDecision {
        let authenticated = self.auth.check_auth().await;
        let is_admin = authenticated && self.auth.is_admin().await;

        let decision = decide(meta, authenticated, is_admin);
        debug!(?meta, authenticated, is_admin, ?decision, "Route guard");
        decision
    }
}

/// The precedence rules, independent of where the session comes from.
const fn decide(meta: &RouteMeta, authenticated: bool, is_admin: bool) -> GuardDecision {
    if meta.requires_admin && !is_admin {
        GuardDecision::Redirect(RedirectTarget::Home)
    } else if meta.requires_auth && !authenticated {
        GuardDecision::Redirect(RedirectTarget::SignIn)
    } else if meta.requires_guest && authenticated {
        GuardDecision::Redirect(RedirectTarget::Home)
    } else {
        GuardDecision::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_check_runs_before_auth_check() {
        // A signed-out visitor on an admin route goes home, not to sign-in.
        assert_eq!(
            decide(&RouteMeta::admin(), false, false),
            GuardDecision::Redirect(RedirectTarget::Home)
        );
        assert_eq!(decide(&RouteMeta::admin(), true, true), GuardDecision::Proceed);
    }

    #[test]
    fn test_auth_and_guest_rules() {
        assert_eq!(
            decide(&RouteMeta::authenticated(), false, false),
            GuardDecision::Redirect(RedirectTarget::SignIn)
        );
        assert_eq!(
            decide(&RouteMeta::guest(), true, false),
            GuardDecision::Redirect(RedirectTarget::Home)
        );
        assert_eq!(decide(&RouteMeta::guest(), false, false), GuardDecision::Proceed);
        assert_eq!(decide(&RouteMeta::public(), true, true), GuardDecision::Proceed);
    }

    #[test]
    fn test_contradictory_annotations_follow_precedence() {
        let meta = RouteMeta {
            requires_auth: true,
            requires_guest: true,
            requires_admin: false,
        };
        assert_eq!(
            decide(&meta, false, false),
            GuardDecision::Redirect(RedirectTarget::SignIn)
        );
        assert_eq!(
            decide(&meta, true, false),
            GuardDecision::Redirect(RedirectTarget::Home)
        );
    }

    #[test]
    fn test_redirect_paths() {
        assert_eq!(RedirectTarget::Home.path(), "/");
        assert_eq!(RedirectTarget::SignIn.to_string(), "/sign-in");
    }
}

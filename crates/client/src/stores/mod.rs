//! Client-side stores.
//!
//! Each store owns one slice of application state and the actions that change
//! it. Stores are shared by reference (`&self` actions) and may be driven
//! concurrently; their state sits behind a `tokio::sync::RwLock` that is never
//! held across a gateway call.
//!
//! Two pieces of bookkeeping are common to every store:
//!
//! - [`BusyFlag`] counts in-flight actions; a store is loading while any
//!   action is outstanding.
//! - [`RequestSequence`] hands out increasing tickets so a store can drop a
//!   response once a newer request's response has been applied.

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod payment;

pub use admin::AdminStore;
pub use auth::AuthStore;
pub use cart::CartStore;
pub use catalog::CatalogStore;
pub use payment::PaymentStore;

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Number of actions currently awaiting the gateway.
#[derive(Debug, Default)]
pub struct BusyFlag(AtomicUsize);

impl BusyFlag {
    /// Mark one action as started; it ends when the guard drops.
    pub fn enter(&self) -> BusyGuard<'_> {
        self.0.fetch_add(1, Ordering::SeqCst);
        BusyGuard(&self.0)
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

/// Ends one in-flight action on drop, including on early return.
#[derive(Debug)]
pub struct BusyGuard<'a>(&'a AtomicUsize);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Ticket identifying one issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Orders the responses of overlapping requests.
///
/// A successful response is applied only if no newer one has been applied
/// yet and no fence was raised after its request. A failed request never
/// supersedes anything, so an older success that lands late is still adopted.
#[derive(Debug, Default)]
pub struct RequestSequence {
    issued: AtomicU64,
    applied: AtomicU64,
    fence: AtomicU64,
}

impl RequestSequence {
    /// Issue a ticket newer than every ticket issued before.
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Discard every response to a request issued before `ticket`, whatever
    /// the outcome of `ticket` itself.
    pub fn fence(&self, ticket: Ticket) {
        self.fence.fetch_max(ticket.0, Ordering::SeqCst);
    }

    /// Claim the right to apply the successful response of `ticket`.
    ///
    /// Call with the store's state lock held so claim and write are one step.
    #[must_use]
    pub fn claim(&self, ticket: Ticket) -> bool {
        ticket.0 >= self.fence.load(Ordering::SeqCst)
            && self.applied.fetch_max(ticket.0, Ordering::SeqCst) < ticket.0
    }

    /// Whether a newer response has been applied or a fence passed `ticket`.
    #[must_use]
    pub fn is_stale(&self, ticket: Ticket) -> bool {
        ticket.0 <= self.applied.load(Ordering::SeqCst)
            || ticket.0 < self.fence.load(Ordering::SeqCst)
    }
}

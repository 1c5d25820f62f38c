//! Tetranoma marketplace client library.
//!
//! Client-side stores for the Tetranoma collectibles marketplace:
//!
//! - **Auth**: session state mirrored in a persisted session cache
//! - **Cart**: server-computed cart lines and totals
//! - **Catalog**: figure listing, filters, pagination and favorites
//! - **Payment**: payment-intent handshake for one checkout attempt
//! - **Admin**: back-office users, orders and dashboard statistics
//!
//! Every store talks to the REST API through the [`gateway::Gateway`] trait.
//! [`state::AppState`] wires one instance of each store together;
//! [`guard::RouteGuard`] gates navigation on the auth store's session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod models;
pub mod notify;
pub mod session_cache;
pub mod state;
pub mod stores;

pub use config::ClientConfig;
pub use error::ClientError;
pub use state::AppState;

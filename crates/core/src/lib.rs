//! Tetranoma Core - Shared types library.
//!
//! This crate provides common types used across all Tetranoma components:
//! - `client` - Stores, gateway and route guard for the marketplace API
//! - `cli` - Command-line front end driving the client stores
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, roles and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

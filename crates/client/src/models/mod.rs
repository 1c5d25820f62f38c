//! Wire and domain types for the marketplace API.
//!
//! Field names follow the API's camelCase JSON. Records that the client
//! round-trips (users, figures, orders) keep unknown fields in an `extra` map
//! so nothing the server sent is lost when a record is cached or re-sent.

pub mod admin;
pub mod cart;
pub mod figure;
pub mod order;
pub mod payment;
pub mod user;

pub use admin::*;
pub use cart::*;
pub use figure::*;
pub use order::*;
pub use payment::*;
pub use user::*;

use secrecy::{ExposeSecret, SecretString};
use serde::Serializer;

/// Serialize a secret as a plain string (request bodies only).
fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// Serialize an optional secret; pair with `skip_serializing_if = "Option::is_none"`.
fn serialize_optional_secret<S: Serializer>(
    secret: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => serializer.serialize_str(secret.expose_secret()),
        None => serializer.serialize_none(),
    }
}

//! Newtype IDs for type-safe entity references.
//!
//! The marketplace API hands out document-store ids as strings, while older
//! records and test fixtures use plain integers. Every ID therefore wraps a
//! [`RawId`], which keeps whichever representation the server sent so that a
//! record can be written back (e.g. into the session cache) byte-for-byte.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The wire representation of an entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    /// Numeric identifier (`"id": 1`).
    Int(i64),
    /// String identifier (`"_id": "665f0c..."`).
    Str(String),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around [`RawId`] with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Display`
/// - `From<i64>`, `From<&str>` and `From<String>` implementations
///
/// # Example
///
/// ```rust
/// # use tetranoma_core::define_id;
/// define_id!(UserId);
/// define_id!(FigureId);
///
/// let user_id = UserId::from("u1");
/// let figure_id = FigureId::from(7);
///
/// assert_eq!(user_id.to_string(), "u1");
/// assert_eq!(figure_id.to_string(), "7");
/// // These are different types, so this won't compile:
/// // let _: UserId = figure_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name($crate::types::id::RawId);

        impl $name {
            /// Create an ID from its wire representation.
            #[must_use]
            pub const fn new(raw: $crate::types::id::RawId) -> Self {
                Self(raw)
            }

            /// Get the underlying wire representation.
            #[must_use]
            pub const fn raw(&self) -> &$crate::types::id::RawId {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self($crate::types::id::RawId::Int(id))
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self($crate::types::id::RawId::Str(id.to_owned()))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self($crate::types::id::RawId::Str(id))
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::convert::Infallible;

            /// Parses path-style input: all-digit strings become numeric ids.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(s.parse::<i64>().map_or_else(|_| Self::from(s), Self::from))
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(FigureId);
define_id!(OrderId);
define_id!(PaymentId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_serializes_as_number() {
        let id = UserId::from(1);
        assert_eq!(serde_json::to_string(&id).unwrap(), "1");
    }

    #[test]
    fn test_string_id_serializes_as_string() {
        let id = FigureId::from("665f0c1a");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"665f0c1a\"");
    }

    #[test]
    fn test_deserialize_keeps_representation() {
        let numeric: OrderId = serde_json::from_str("42").unwrap();
        assert_eq!(numeric.raw(), &RawId::Int(42));

        let text: OrderId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(text.raw(), &RawId::Str("42".to_string()));
        assert_ne!(numeric, text);
    }

    #[test]
    fn test_from_str_prefers_numbers() {
        let id: FigureId = "17".parse().unwrap();
        assert_eq!(id, FigureId::from(17));

        let id: FigureId = "abc17".parse().unwrap();
        assert_eq!(id, FigureId::from("abc17"));
    }

    #[test]
    fn test_display() {
        assert_eq!(PaymentId::from("pi_123").to_string(), "pi_123");
        assert_eq!(UserId::from(9).to_string(), "9");
    }
}

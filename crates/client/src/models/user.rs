//! Account and session types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tetranoma_core::{UserId, UserRole};

/// A user record as returned by the API and mirrored in the session cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(alias = "_id")]
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    /// Any other fields the server sent (activity counters, timestamps...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// Role of the user; records without one are regular users.
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.role.unwrap_or_default()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role().is_admin()
    }

    /// Name to show for this user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.email)
    }
}

/// The authentication state owned by the auth store.
///
/// `is_authenticated` is `true` exactly when `user` is present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<UserRecord>,
    pub is_authenticated: bool,
}

impl Session {
    /// An authenticated session for `user`.
    #[must_use]
    pub const fn signed_in(user: UserRecord) -> Self {
        Self {
            user: Some(user),
            is_authenticated: true,
        }
    }
}

/// Sign-in credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    #[serde(serialize_with = "super::serialize_secret")]
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Registration payload, also used by admins to create users.
#[derive(Debug, Clone, Serialize)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    #[serde(serialize_with = "super::serialize_secret")]
    pub password: SecretString,
    /// Only honoured by the admin endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl NewAccount {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: SecretString::from(password.into()),
            role: None,
        }
    }

    #[must_use]
    pub const fn with_role(mut self, role: UserRole) -> Self {
        self.role = Some(role);
        self
    }
}

/// Profile changes; unset fields are left alone by the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "super::serialize_optional_secret"
    )]
    pub password: Option<SecretString>,
}

/// `{user}` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEnvelope {
    pub user: UserRecord,
}

/// Response to account creation. The server may or may not echo the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountCreated {
    #[serde(default)]
    pub user: Option<UserRecord>,
    #[serde(default)]
    pub message: Option<String>,
}

//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use attire_core::{Email, UserId};

/// A registered user.
///
/// Accounts are created by password registration, OTP verification, or the
/// first federated login. `password_hash` is `None` for accounts that have
/// only ever signed in via OTP or OAuth.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,
    pub email: Email,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub street_address: Option<String>,
    pub unit_number: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub full_address: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account has a password set (OTP/OAuth accounts may not).
    #[must_use]
    pub const fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// A federated identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FederatedProvider {
    Google,
    Facebook,
}

impl FederatedProvider {
    /// The `users` column holding this provider's subject id.
    #[must_use]
    pub const fn id_column(self) -> &'static str {
        match self {
            Self::Google => "google_id",
            Self::Facebook => "facebook_id",
        }
    }
}

impl std::fmt::Display for FederatedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Google => write!(f, "google"),
            Self::Facebook => write!(f, "facebook"),
        }
    }
}

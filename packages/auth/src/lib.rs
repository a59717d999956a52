#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accounts and sign-in for galamsey watch.
//!
//! Supports email/password accounts and Google sign-in. Users and sessions
//! are kept behind [`repository::AuthRepository`]; the `SQLite` store is the
//! production implementation. Sessions are opaque random tokens with a fixed
//! lifetime.

pub mod config;
pub mod error;
pub mod oauth;
pub mod password;
pub mod repository;
pub mod service;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, Registration, SignInStrategy};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How an account signs in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuthProvider {
    /// Email and password
    Credentials,
    /// Google OAuth
    Google,
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Present only for [`AuthProvider::Credentials`] accounts.
    pub password_hash: Option<String>,
    pub provider: AuthProvider,
}

impl User {
    /// The account without its password hash.
    #[must_use]
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// The parts of a user that may be sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A stored sign-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// What a client receives after signing in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub token: String,
    pub user: PublicUser,
    pub expires_at: DateTime<Utc>,
}

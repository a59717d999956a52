//! User and session storage.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue, Row};

use crate::{AuthError, AuthProvider, Session, User};

/// Persistence for accounts and sessions.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Looks up a user by (normalized) email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    /// Looks up a user by id.
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AuthError>;

    /// Stores a new user. Fails with [`AuthError::EmailInUse`] if the email
    /// is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AuthError>;

    /// Stores a new session.
    async fn insert_session(&self, session: &Session) -> Result<(), AuthError>;

    /// Looks up a session by token, expired or not.
    async fn find_session(&self, token: &str) -> Result<Option<Session>, AuthError>;

    /// Deletes a session. Returns `false` if it did not exist.
    async fn delete_session(&self, token: &str) -> Result<bool, AuthError>;
}

/// [`AuthRepository`] over the `users` and `sessions` tables.
#[derive(Clone)]
pub struct SqlAuthRepository {
    db: Arc<dyn Database>,
}

impl std::fmt::Debug for SqlAuthRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlAuthRepository").finish_non_exhaustive()
    }
}

impl SqlAuthRepository {
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

fn storage(e: impl std::fmt::Display) -> AuthError {
    AuthError::Storage(e.to_string())
}

#[async_trait]
impl AuthRepository for SqlAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT * FROM users WHERE email = $1",
                &[DatabaseValue::String(email.to_string())],
            )
            .await
            .map_err(storage)?;

        rows.first().map(user_from_row).transpose()
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AuthError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT * FROM users WHERE id = $1",
                &[DatabaseValue::String(id.to_string())],
            )
            .await
            .map_err(storage)?;

        rows.first().map(user_from_row).transpose()
    }

    async fn insert_user(&self, user: &User) -> Result<(), AuthError> {
        // The UNIQUE constraint still guards against a concurrent insert.
        if self.find_user_by_email(&user.email).await?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        self.db
            .exec_raw_params(
                "INSERT INTO users (id, name, email, password_hash, provider, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    DatabaseValue::String(user.id.clone()),
                    DatabaseValue::String(user.name.clone()),
                    DatabaseValue::String(user.email.clone()),
                    user.password_hash
                        .clone()
                        .map_or(DatabaseValue::Null, DatabaseValue::String),
                    DatabaseValue::String(user.provider.as_ref().to_string()),
                    DatabaseValue::String(Utc::now().to_rfc3339()),
                ],
            )
            .await
            .map_err(storage)?;

        Ok(())
    }

    async fn insert_session(&self, session: &Session) -> Result<(), AuthError> {
        self.db
            .exec_raw_params(
                "INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)",
                &[
                    DatabaseValue::String(session.token.clone()),
                    DatabaseValue::String(session.user_id.clone()),
                    DatabaseValue::String(session.expires_at.to_rfc3339()),
                ],
            )
            .await
            .map_err(storage)?;

        Ok(())
    }

    async fn find_session(&self, token: &str) -> Result<Option<Session>, AuthError> {
        let rows = self
            .db
            .query_raw_params(
                "SELECT token, user_id, expires_at FROM sessions WHERE token = $1",
                &[DatabaseValue::String(token.to_string())],
            )
            .await
            .map_err(storage)?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let expires_at: String = row.to_value("expires_at").unwrap_or_default();
        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .map_err(|e| AuthError::Storage(format!("bad session expiry {expires_at:?}: {e}")))?
            .with_timezone(&Utc);

        Ok(Some(Session {
            token: row.to_value("token").unwrap_or_default(),
            user_id: row.to_value("user_id").unwrap_or_default(),
            expires_at,
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<bool, AuthError> {
        let deleted = self
            .db
            .exec_raw_params(
                "DELETE FROM sessions WHERE token = $1",
                &[DatabaseValue::String(token.to_string())],
            )
            .await
            .map_err(storage)?;

        Ok(deleted > 0)
    }
}

fn user_from_row(row: &Row) -> Result<User, AuthError> {
    let provider: String = row.to_value("provider").unwrap_or_default();
    let provider = provider
        .parse::<AuthProvider>()
        .map_err(|e| AuthError::Storage(format!("bad provider {provider:?}: {e}")))?;

    Ok(User {
        id: row.to_value("id").unwrap_or_default(),
        name: row.to_value("name").unwrap_or_default(),
        email: row.to_value("email").unwrap_or_default(),
        password_hash: row.to_value("password_hash").unwrap_or(None),
        provider,
    })
}

//! Registration, sign-in and sessions.

use std::sync::Arc;

use chrono::Utc;

use crate::config::AuthConfig;
use crate::oauth::OAuthExchange;
use crate::password::{hash_password, verify_password};
use crate::repository::AuthRepository;
use crate::{AuthError, AuthProvider, PublicUser, Session, SessionGrant, User};

/// Fields submitted by the registration form.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// How a user proves who they are.
#[derive(Debug, Clone)]
pub enum SignInStrategy {
    /// Email and password.
    Credentials { email: String, password: String },
    /// Authorization code returned by an OAuth provider.
    OAuth { provider: AuthProvider, code: String },
}

/// Start of an OAuth sign-in: send the user to `url`, remember `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthStart {
    pub url: String,
    pub state: String,
}

/// Client-side check that a password was typed the same way twice.
///
/// # Errors
///
/// Returns [`AuthError::PasswordMismatch`] if they differ.
pub fn confirm_password(password: &str, confirmation: &str) -> Result<(), AuthError> {
    if password == confirmation {
        Ok(())
    } else {
        Err(AuthError::PasswordMismatch)
    }
}

/// Account and session operations.
#[derive(Clone)]
pub struct AuthService {
    config: AuthConfig,
    repository: Arc<dyn AuthRepository>,
    google: Option<Arc<dyn OAuthExchange>>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .field("google", &self.google.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthService {
    #[must_use]
    pub fn new(config: AuthConfig, repository: Arc<dyn AuthRepository>) -> Self {
        Self {
            config,
            repository,
            google: None,
        }
    }

    /// Enables Google sign-in through `google`.
    #[must_use]
    pub fn with_google(mut self, google: Arc<dyn OAuthExchange>) -> Self {
        self.google = Some(google);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Creates a password account.
    ///
    /// # Errors
    ///
    /// [`AuthError::MissingFields`] if any field is blank,
    /// [`AuthError::EmailInUse`] if the email has an account, or
    /// [`AuthError::Storage`].
    pub async fn register(&self, registration: &Registration) -> Result<PublicUser, AuthError> {
        let name = registration.name.trim();
        let email = normalize_email(&registration.email);
        if name.is_empty() || email.is_empty() || registration.password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email,
            password_hash: Some(hash_password(&registration.password)),
            provider: AuthProvider::Credentials,
        };
        self.repository.insert_user(&user).await?;

        log::info!("Registered user {}", user.id);
        Ok(user.public())
    }

    /// Begins an OAuth sign-in with `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::OAuthSignin`] if the provider is not configured.
    pub fn begin_oauth(&self, provider: AuthProvider) -> Result<OAuthStart, AuthError> {
        let exchange = self.exchange_for(provider)?;
        let state = uuid::Uuid::new_v4().simple().to_string();
        let url = exchange.authorization_url(&state, &self.config.callback_url(provider.as_ref()));
        Ok(OAuthStart { url, state })
    }

    /// Verifies the user and opens a session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::MissingFields`] for blank credentials
    /// - [`AuthError::CredentialsSignin`] for an unknown email or wrong
    ///   password
    /// - [`AuthError::OAuthSignin`] or [`AuthError::OAuthCallback`] when
    ///   the provider flow fails
    /// - [`AuthError::AccessDenied`] for an unverified provider email
    /// - [`AuthError::OAuthAccountNotLinked`] when the email belongs to a
    ///   different provider
    pub async fn sign_in(&self, strategy: SignInStrategy) -> Result<SessionGrant, AuthError> {
        let user = match strategy {
            SignInStrategy::Credentials { email, password } => {
                self.verify_credentials(&email, &password).await?
            }
            SignInStrategy::OAuth { provider, code } => self.complete_oauth(provider, &code).await?,
        };

        let session = Session {
            token: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            expires_at: Utc::now() + self.config.session_ttl,
        };
        self.repository.insert_session(&session).await?;
        log::debug!("Opened session for user {}", user.id);

        Ok(SessionGrant {
            token: session.token,
            user: user.public(),
            expires_at: session.expires_at,
        })
    }

    /// Returns the session for `token` if it exists and has not expired.
    /// Expired sessions are deleted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the store fails.
    pub async fn session(&self, token: &str) -> Result<Option<SessionGrant>, AuthError> {
        let Some(session) = self.repository.find_session(token).await? else {
            return Ok(None);
        };

        if session.expires_at <= Utc::now() {
            self.repository.delete_session(token).await?;
            return Ok(None);
        }

        let Some(user) = self.repository.find_user_by_id(&session.user_id).await? else {
            log::warn!("Session refers to missing user {}", session.user_id);
            self.repository.delete_session(token).await?;
            return Ok(None);
        };

        Ok(Some(SessionGrant {
            token: session.token,
            user: user.public(),
            expires_at: session.expires_at,
        }))
    }

    /// Ends a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the store fails.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.repository.delete_session(token).await?;
        Ok(())
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let user = self
            .repository
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::CredentialsSignin)?;

        match &user.password_hash {
            Some(hash) if verify_password(password, hash) => Ok(user),
            _ => Err(AuthError::CredentialsSignin),
        }
    }

    async fn complete_oauth(&self, provider: AuthProvider, code: &str) -> Result<User, AuthError> {
        let exchange = self.exchange_for(provider)?;
        if code.trim().is_empty() {
            return Err(AuthError::OAuthCallback {
                message: "missing authorization code".to_string(),
            });
        }

        let redirect_uri = self.config.callback_url(provider.as_ref());
        let profile = exchange.exchange(code, &redirect_uri).await?;
        if !profile.email_verified {
            return Err(AuthError::AccessDenied);
        }

        let email = normalize_email(&profile.email);
        if let Some(existing) = self.repository.find_user_by_email(&email).await? {
            if existing.provider != provider {
                return Err(AuthError::OAuthAccountNotLinked);
            }
            return Ok(existing);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: profile
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| email.clone()),
            email,
            password_hash: None,
            provider,
        };
        self.repository.insert_user(&user).await?;
        log::info!("Created {provider} user {}", user.id);
        Ok(user)
    }

    fn exchange_for(&self, provider: AuthProvider) -> Result<&dyn OAuthExchange, AuthError> {
        match provider {
            AuthProvider::Google => self.google.as_deref(),
            AuthProvider::Credentials => None,
        }
        .ok_or_else(|| AuthError::OAuthSignin {
            provider: provider.to_string(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

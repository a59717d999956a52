//! Google OAuth 2.0 authorization-code flow.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::AuthError;
use crate::config::GoogleCredentials;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// The identity returned by a provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthProfile {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
}

/// One OAuth provider.
#[async_trait]
pub trait OAuthExchange: Send + Sync {
    /// The page the user is sent to in order to sign in.
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> String;

    /// Trades an authorization code for the user's profile.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::OAuthCallback`] if the provider rejects the
    /// code or cannot be reached.
    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<OAuthProfile, AuthError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google sign-in client.
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    client: reqwest::Client,
    credentials: GoogleCredentials,
}

impl GoogleOAuth {
    #[must_use]
    pub const fn new(client: reqwest::Client, credentials: GoogleCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

fn callback_error(e: impl std::fmt::Display) -> AuthError {
    AuthError::OAuthCallback {
        message: e.to_string(),
    }
}

#[async_trait]
impl OAuthExchange for GoogleOAuth {
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> String {
        Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("state", state),
            ],
        )
        .map_or_else(|_| AUTHORIZE_URL.to_string(), String::from)
    }

    async fn exchange(&self, code: &str, redirect_uri: &str) -> Result<OAuthProfile, AuthError> {
        let resp = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(callback_error)?;

        if !resp.status().is_success() {
            return Err(callback_error(format!(
                "token endpoint returned HTTP {}",
                resp.status().as_u16()
            )));
        }
        let token: TokenResponse = resp.json().await.map_err(callback_error)?;

        let resp = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(callback_error)?;

        if !resp.status().is_success() {
            return Err(callback_error(format!(
                "userinfo endpoint returned HTTP {}",
                resp.status().as_u16()
            )));
        }
        resp.json().await.map_err(callback_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_url_carries_state_and_callback() {
        let google = GoogleOAuth::new(
            reqwest::Client::new(),
            GoogleCredentials {
                client_id: "client-123".to_string(),
                client_secret: "secret".to_string(),
            },
        );
        let url = Url::parse(&google.authorization_url(
            "abc",
            "http://127.0.0.1:8080/api/auth/callback/google",
        ))
        .unwrap();

        let params: std::collections::BTreeMap<String, String> =
            url.query_pairs().into_owned().collect();
        assert_eq!(url.host_str(), Some("accounts.google.com"));
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["state"], "abc");
        assert_eq!(
            params["redirect_uri"],
            "http://127.0.0.1:8080/api/auth/callback/google"
        );
        assert!(!params.contains_key("client_secret"));
    }
}

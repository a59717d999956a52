//! Authentication configuration, built once at startup.
//!
//! Every callback and redirect URL is derived from [`AuthConfig::base_url`].
//! Nothing recomputes the site origin per request.

use reqwest::Url;

use crate::AuthError;

/// Base URL used when `GALAMSEY_WATCH_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Session lifetime used when `GALAMSEY_WATCH_SESSION_TTL_HOURS` is unset.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 720;

const SESSION_TTL_VAR: &str = "GALAMSEY_WATCH_SESSION_TTL_HOURS";

/// OAuth client credentials for Google sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Site-wide authentication settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    base_url: Url,
    /// `None` disables Google sign-in.
    pub google: Option<GoogleCredentials>,
    /// How long a session stays valid after sign-in.
    pub session_ttl: chrono::Duration,
}

impl AuthConfig {
    /// Creates a configuration for the site at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if `base_url` is not an absolute
    /// `http`/`https` URL.
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        let parsed = Url::parse(base_url.trim()).map_err(|e| AuthError::Config {
            message: format!("invalid base URL {base_url:?}: {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(AuthError::Config {
                message: format!("base URL must be an http(s) origin, got {base_url:?}"),
            });
        }

        Ok(Self {
            base_url: parsed,
            google: None,
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        })
    }

    /// Reads `GALAMSEY_WATCH_BASE_URL`, `GOOGLE_CLIENT_ID`,
    /// `GOOGLE_CLIENT_SECRET` and `GALAMSEY_WATCH_SESSION_TTL_HOURS`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, AuthError> {
        let base_url = non_empty_env("GALAMSEY_WATCH_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;

        config.google = match (
            non_empty_env("GOOGLE_CLIENT_ID"),
            non_empty_env("GOOGLE_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(client_secret)) => Some(GoogleCredentials {
                client_id,
                client_secret,
            }),
            (None, None) => None,
            _ => {
                log::warn!("Incomplete Google credentials, Google sign-in disabled");
                None
            }
        };

        if let Some(hours) = non_empty_env(SESSION_TTL_VAR) {
            let hours: i64 = hours.parse().map_err(|_| AuthError::Config {
                message: format!("{SESSION_TTL_VAR} must be a whole number, got {hours:?}"),
            })?;
            if hours <= 0 {
                return Err(AuthError::Config {
                    message: format!("{SESSION_TTL_VAR} must be positive"),
                });
            }
            config.session_ttl = chrono::Duration::hours(hours);
        }

        log::info!("Auth base URL: {}", config.base_url());
        Ok(config)
    }

    /// The site origin without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Where `provider` redirects back to after sign-in.
    #[must_use]
    pub fn callback_url(&self, provider: &str) -> String {
        format!("{}/api/auth/callback/{provider}", self.base_url())
    }

    /// Resolves a post-sign-in redirect target.
    ///
    /// Relative paths are joined to the base URL and same-origin absolute
    /// URLs are kept. Anything else, including protocol-relative `//host`
    /// paths, resolves to the base URL.
    #[must_use]
    pub fn resolve_redirect(&self, target: Option<&str>) -> String {
        let Some(target) = target.map(str::trim).filter(|t| !t.is_empty()) else {
            return self.base_url().to_string();
        };

        if target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\") {
            return format!("{}{target}", self.base_url());
        }

        match Url::parse(target) {
            Ok(url) if url.origin() == self.base_url.origin() => url.into(),
            _ => {
                log::debug!("Rejecting off-site redirect target {target:?}");
                self.base_url().to_string()
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new("https://galamsey.example.org/").unwrap()
    }

    #[test]
    fn callback_urls_derive_from_base() {
        assert_eq!(
            config().callback_url("google"),
            "https://galamsey.example.org/api/auth/callback/google"
        );
    }

    #[test]
    fn redirects_stay_on_site() {
        let config = config();
        assert_eq!(
            config.resolve_redirect(Some("/report")),
            "https://galamsey.example.org/report"
        );
        assert_eq!(
            config.resolve_redirect(Some("https://galamsey.example.org/licenses?status=active")),
            "https://galamsey.example.org/licenses?status=active"
        );
        assert_eq!(
            config.resolve_redirect(Some("https://evil.example.com/report")),
            "https://galamsey.example.org"
        );
        assert_eq!(
            config.resolve_redirect(Some("//evil.example.com")),
            "https://galamsey.example.org"
        );
        assert_eq!(
            config.resolve_redirect(Some("http://galamsey.example.org/")),
            "https://galamsey.example.org"
        );
        assert_eq!(config.resolve_redirect(None), "https://galamsey.example.org");
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(AuthConfig::new("not a url").is_err());
        assert!(AuthConfig::new("ftp://example.org").is_err());
        assert_eq!(
            AuthConfig::new(DEFAULT_BASE_URL).unwrap().session_ttl,
            chrono::Duration::hours(720)
        );
    }
}

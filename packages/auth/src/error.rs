//! Authentication errors and the fixed messages shown for them.

use thiserror::Error;

/// Shown for any error code without a dedicated message.
pub const DEFAULT_MESSAGE: &str = "Authentication failed. Please try again.";

/// Errors from registration, sign-in and session handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider or policy refused the sign-in.
    #[error("Access denied")]
    AccessDenied,

    /// The email already belongs to an account using another provider.
    #[error("Email is linked to a different sign-in provider")]
    OAuthAccountNotLinked,

    /// Starting the provider sign-in failed, e.g. the provider is not configured.
    #[error("Could not start sign-in with {provider}")]
    OAuthSignin {
        /// Provider name.
        provider: String,
    },

    /// The provider callback could not be completed.
    #[error("OAuth callback failed: {message}")]
    OAuthCallback {
        /// What went wrong.
        message: String,
    },

    /// Unknown email or wrong password.
    #[error("Invalid credentials")]
    CredentialsSignin,

    /// A required field was empty.
    #[error("Missing required fields")]
    MissingFields,

    /// Registration with an email that already has an account.
    #[error("Email already in use")]
    EmailInUse,

    /// Password and confirmation differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// The user or session store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Startup configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

impl AuthError {
    /// Stable code sent to clients in the `error` field.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AccessDenied => "AccessDenied",
            Self::OAuthAccountNotLinked => "OAuthAccountNotLinked",
            Self::OAuthSignin { .. } => "OAuthSignin",
            Self::OAuthCallback { .. } => "OAuthCallback",
            Self::CredentialsSignin => "CredentialsSignin",
            Self::MissingFields => "MissingFields",
            Self::EmailInUse => "EmailInUse",
            Self::PasswordMismatch => "PasswordMismatch",
            Self::Storage(_) => "Storage",
            Self::Config { .. } => "Configuration",
        }
    }

    /// Text shown to the user. Never includes internal details.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::EmailInUse => "Email already in use",
            Self::PasswordMismatch => "Passwords do not match",
            _ => message_for_code(self.code()),
        }
    }

    /// Whether the error was caused by the request rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Config { .. })
    }
}

/// Maps a provider error code to its user-facing message.
#[must_use]
pub const fn message_for_code(code: &str) -> &'static str {
    match code.as_bytes() {
        b"AccessDenied" => "Access denied. You may not have permission to sign in",
        b"OAuthAccountNotLinked" => "Email already in use with a different provider",
        b"OAuthSignin" | b"OAuthCallback" => "Error occurred during authentication",
        b"CredentialsSignin" => "Invalid email or password",
        b"MissingFields" => "Please fill all required fields",
        _ => DEFAULT_MESSAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_fixed_messages() {
        assert_eq!(
            message_for_code("AccessDenied"),
            "Access denied. You may not have permission to sign in"
        );
        assert_eq!(
            message_for_code("OAuthAccountNotLinked"),
            "Email already in use with a different provider"
        );
        assert_eq!(
            message_for_code("OAuthSignin"),
            "Error occurred during authentication"
        );
        assert_eq!(
            message_for_code("OAuthCallback"),
            "Error occurred during authentication"
        );
        assert_eq!(message_for_code("CredentialsSignin"), "Invalid email or password");
        assert_eq!(message_for_code("Verification"), DEFAULT_MESSAGE);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AuthError::Storage("disk I/O error at /var/lib".to_string());
        assert_eq!(err.user_message(), DEFAULT_MESSAGE);
        assert!(!err.is_client_error());
        assert_eq!(AuthError::PasswordMismatch.user_message(), "Passwords do not match");
        assert_eq!(
            AuthError::MissingFields.user_message(),
            "Please fill all required fields"
        );
    }
}

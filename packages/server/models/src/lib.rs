#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the galamsey watch server.
//!
//! Field names follow the JSON contract of the web client, which is why
//! report records stay `snake_case` while most other bodies are
//! `camelCase`.

use galamsey_watch_auth::{AuthError, PublicUser};
use galamsey_watch_license_models::{LicenseQuery, LicenseStatus};
use galamsey_watch_report_models::StoredReport;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is up.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Short error text, or an auth error code.
    pub error: String,
    /// User-facing explanation, for auth errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    /// An error with text only.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }
}

impl From<&AuthError> for ApiError {
    fn from(err: &AuthError) -> Self {
        Self {
            error: err.code().to_string(),
            message: Some(err.user_message().to_string()),
        }
    }
}

/// A plain confirmation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

/// Query parameters for `GET /api/reports`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQueryParams {
    /// Return only this report.
    pub id: Option<String>,
}

/// `GET /api/reports` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiReportList {
    pub reports: Vec<StoredReport>,
}

/// `GET /api/reports?id=` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiReportEnvelope {
    pub report: StoredReport,
}

/// `POST /api/reports/status` body. Both fields are required, but are
/// optional here so a missing one yields a 400 with a JSON error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub report_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Query parameters for `GET /api/geocode`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeocodeQueryParams {
    /// Free-text place name.
    #[serde(default)]
    pub q: String,
}

/// Query parameters for `GET /api/licenses`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LicenseQueryParams {
    /// `active`, `pending`, `revoked` or `expired`.
    pub status: Option<String>,
    pub region: Option<String>,
}

impl TryFrom<LicenseQueryParams> for LicenseQuery {
    type Error = ApiError;

    fn try_from(params: LicenseQueryParams) -> Result<Self, Self::Error> {
        let status = params
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<LicenseStatus>()
                    .map_err(|_| ApiError::new(format!("Unknown license status: {s}")))
            })
            .transpose()?;

        Ok(Self {
            status,
            region: params.region,
        })
    }
}

/// `GET /api/licenses` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLicenseList {
    pub licenses: Vec<galamsey_watch_license_models::MiningLicense>,
}

/// `POST /api/auth/register` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /api/auth/register` success response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: PublicUser,
    pub message: String,
}

/// `POST /api/auth/signin/credentials` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsSignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Where to send the user afterwards.
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Query parameters for `GET /api/auth/signin/{provider}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthSignInParams {
    pub callback_url: Option<String>,
}

/// Query parameters of the provider callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user declined.
    pub error: Option<String>,
}

/// Response of a successful sign-in or session lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSession {
    pub user: PublicUser,
    /// RFC 3339 expiry.
    pub expires: String,
    /// Where the client should navigate next, for sign-in responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_update_accepts_partial_bodies() {
        let req: StatusUpdateRequest =
            serde_json::from_str(r#"{"reportId":"ID-AAAA1111"}"#).unwrap();
        assert_eq!(req.report_id.as_deref(), Some("ID-AAAA1111"));
        assert!(req.status.is_none());
    }

    #[test]
    fn license_params_reject_unknown_status() {
        let query = LicenseQuery::try_from(LicenseQueryParams {
            status: Some("revoked".to_string()),
            region: None,
        })
        .unwrap();
        assert_eq!(query.status, Some(LicenseStatus::Revoked));

        assert!(
            LicenseQuery::try_from(LicenseQueryParams {
                status: Some("suspended".to_string()),
                region: None,
            })
            .is_err()
        );
    }

    #[test]
    fn auth_errors_carry_code_and_message() {
        let body = ApiError::from(&AuthError::CredentialsSignin);
        assert_eq!(body.error, "CredentialsSignin");
        assert_eq!(body.message.as_deref(), Some("Invalid email or password"));
        assert_eq!(
            serde_json::to_value(ApiError::new("Report not found")).unwrap(),
            serde_json::json!({"error": "Report not found"})
        );
    }
}

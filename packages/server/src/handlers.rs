//! HTTP handler functions for the galamsey watch API.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use galamsey_watch_auth::{AuthError, AuthProvider, Registration, SignInStrategy};
use galamsey_watch_database::{licenses, reports};
use galamsey_watch_license_models::LicenseQuery;
use galamsey_watch_report_models::{ReportRecord, ReportStatus, StoreOutcome};
use galamsey_watch_server_models::{
    ApiError, ApiHealth, ApiLicenseList, ApiMessage, ApiReportEnvelope, ApiReportList, ApiSession,
    CredentialsSignInRequest, GeocodeQueryParams, LicenseQueryParams, OAuthCallbackParams,
    OAuthSignInParams, RegisterRequest, RegisterResponse, ReportQueryParams, StatusUpdateRequest,
};

use crate::AppState;

/// Cookie holding the session token.
pub const SESSION_COOKIE: &str = "galamsey_watch_session";
const OAUTH_STATE_COOKIE: &str = "galamsey_watch_oauth_state";
const OAUTH_REDIRECT_COOKIE: &str = "galamsey_watch_oauth_redirect";

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/reports`
///
/// Stores a submitted report. The body is decoded by hand so that a
/// malformed one still gets a JSON answer.
pub async fn submit_report(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let record: ReportRecord = match serde_json::from_slice(&body) {
        Ok(record) => record,
        Err(e) => {
            log::warn!("Rejected malformed report body: {e}");
            return HttpResponse::BadRequest().json(StoreOutcome::failed(format!(
                "Invalid report: {e}"
            )));
        }
    };

    match reports::insert_report(state.db.as_ref(), &record).await {
        Ok(()) => {
            log::info!("Stored report {}", record.report_id);
            HttpResponse::Created().json(StoreOutcome::stored())
        }
        Err(e) => {
            log::error!("Failed to store report {}: {e}", record.report_id);
            HttpResponse::InternalServerError().json(StoreOutcome::failed("Failed to store report"))
        }
    }
}

/// `GET /api/reports[?id=]`
pub async fn get_reports(
    state: web::Data<AppState>,
    params: web::Query<ReportQueryParams>,
) -> HttpResponse {
    if let Some(id) = params.id.as_deref().filter(|id| !id.is_empty()) {
        return match reports::get_report_by_id(state.db.as_ref(), id).await {
            Ok(Some(report)) => HttpResponse::Ok().json(ApiReportEnvelope { report }),
            Ok(None) => HttpResponse::NotFound().json(ApiError::new("Report not found")),
            Err(e) => {
                log::error!("Failed to fetch report {id}: {e}");
                HttpResponse::InternalServerError().json(ApiError::new("Failed to fetch reports"))
            }
        };
    }

    match reports::get_all_reports(state.db.as_ref()).await {
        Ok(reports) => HttpResponse::Ok().json(ApiReportList { reports }),
        Err(e) => {
            log::error!("Failed to fetch reports: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to fetch reports"))
        }
    }
}

/// `POST /api/reports/status`
pub async fn update_report_status(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let missing = || HttpResponse::BadRequest().json(ApiError::new("Missing required fields"));

    let Ok(req) = serde_json::from_slice::<StatusUpdateRequest>(&body) else {
        return missing();
    };
    let (Some(report_id), Some(status)) = (
        req.report_id.filter(|id| !id.is_empty()),
        req.status.and_then(|s| s.parse::<ReportStatus>().ok()),
    ) else {
        return missing();
    };

    match reports::update_report_status(state.db.as_ref(), &report_id, status).await {
        Ok(true) => {
            log::info!("Report {report_id} is now {status}");
            HttpResponse::Ok().json(ApiMessage {
                message: "Report status updated successfully".to_string(),
            })
        }
        Ok(false) => HttpResponse::NotFound().json(ApiError::new("Report not found")),
        Err(e) => {
            log::error!("Failed to update report {report_id}: {e}");
            HttpResponse::InternalServerError()
                .json(ApiError::new("Failed to update report status"))
        }
    }
}

/// `GET /api/geocode?q=`
///
/// Never fails: provider errors are answered with the fallback list.
pub async fn geocode(
    state: web::Data<AppState>,
    params: web::Query<GeocodeQueryParams>,
) -> HttpResponse {
    HttpResponse::Ok().json(state.resolver.resolve(&params.q).await)
}

/// `GET /api/licenses?status=&region=`
pub async fn list_licenses(
    state: web::Data<AppState>,
    params: web::Query<LicenseQueryParams>,
) -> HttpResponse {
    let query = match LicenseQuery::try_from(params.into_inner()) {
        Ok(query) => query,
        Err(e) => return HttpResponse::BadRequest().json(e),
    };

    match licenses::list_licenses(state.db.as_ref(), &query).await {
        Ok(licenses) => HttpResponse::Ok().json(ApiLicenseList { licenses }),
        Err(e) => {
            log::error!("Failed to list licenses: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to fetch licenses"))
        }
    }
}

/// `POST /api/auth/register`
pub async fn register(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let Ok(req) = serde_json::from_slice::<RegisterRequest>(&body) else {
        return HttpResponse::BadRequest().json(ApiError::new("Missing required fields"));
    };

    let registration = Registration {
        name: req.name,
        email: req.email,
        password: req.password,
    };

    match state.auth.register(&registration).await {
        Ok(user) => HttpResponse::Created().json(RegisterResponse {
            user,
            message: "User registered successfully".to_string(),
        }),
        Err(AuthError::MissingFields) => {
            HttpResponse::BadRequest().json(ApiError::new("Missing required fields"))
        }
        Err(AuthError::EmailInUse) => {
            HttpResponse::Conflict().json(ApiError::new("Email already in use"))
        }
        Err(e) => {
            log::error!("Registration error: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Registration failed"))
        }
    }
}

/// `POST /api/auth/signin/credentials`
pub async fn sign_in_credentials(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let Ok(req) = serde_json::from_slice::<CredentialsSignInRequest>(&body) else {
        return auth_error_response(&AuthError::MissingFields);
    };
    let redirect = state.auth.config().resolve_redirect(req.callback_url.as_deref());

    match state
        .auth
        .sign_in(SignInStrategy::Credentials {
            email: req.email,
            password: req.password,
        })
        .await
    {
        Ok(grant) => HttpResponse::Ok()
            .cookie(session_cookie(&state, &grant.token))
            .json(ApiSession {
                user: grant.user,
                expires: grant.expires_at.to_rfc3339(),
                redirect: Some(redirect),
            }),
        Err(e) => auth_error_response(&e),
    }
}

/// `GET /api/auth/signin/{provider}`
///
/// Redirects to the provider, remembering the anti-forgery state and the
/// post-sign-in target in short-lived cookies.
pub async fn sign_in_oauth(
    state: web::Data<AppState>,
    path: web::Path<String>,
    params: web::Query<OAuthSignInParams>,
) -> HttpResponse {
    let provider = match oauth_provider(&path) {
        Ok(provider) => provider,
        Err(e) => return auth_error_response(&e),
    };

    match state.auth.begin_oauth(provider) {
        Ok(start) => {
            let redirect = state
                .auth
                .config()
                .resolve_redirect(params.callback_url.as_deref());
            HttpResponse::Found()
                .insert_header((header::LOCATION, start.url))
                .cookie(flow_cookie(&state, OAUTH_STATE_COOKIE, start.state))
                .cookie(flow_cookie(&state, OAUTH_REDIRECT_COOKIE, redirect))
                .finish()
        }
        Err(e) => auth_error_response(&e),
    }
}

/// `GET /api/auth/callback/{provider}`
pub async fn oauth_callback(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    params: web::Query<OAuthCallbackParams>,
) -> HttpResponse {
    let provider = match oauth_provider(&path) {
        Ok(provider) => provider,
        Err(e) => return auth_error_response(&e),
    };
    let params = params.into_inner();

    if let Some(error) = params.error {
        log::info!("{provider} sign-in declined: {error}");
        return auth_error_response(&AuthError::AccessDenied);
    }

    let expected_state = req.cookie(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    if expected_state.is_none() || expected_state != params.state {
        return auth_error_response(&AuthError::OAuthCallback {
            message: "state mismatch".to_string(),
        });
    }

    let Some(code) = params.code else {
        return auth_error_response(&AuthError::OAuthCallback {
            message: "missing authorization code".to_string(),
        });
    };

    match state
        .auth
        .sign_in(SignInStrategy::OAuth { provider, code })
        .await
    {
        Ok(grant) => {
            let target = state.auth.config().resolve_redirect(
                req.cookie(OAUTH_REDIRECT_COOKIE)
                    .as_ref()
                    .map(Cookie::value),
            );
            HttpResponse::Found()
                .insert_header((header::LOCATION, target))
                .cookie(session_cookie(&state, &grant.token))
                .cookie(removal_cookie(OAUTH_STATE_COOKIE))
                .cookie(removal_cookie(OAUTH_REDIRECT_COOKIE))
                .finish()
        }
        Err(e) => auth_error_response(&e),
    }
}

/// `GET /api/auth/session`
pub async fn session(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let Some(token) = session_token(&req) else {
        return HttpResponse::Unauthorized().json(ApiError::new("No active session"));
    };

    match state.auth.session(&token).await {
        Ok(Some(grant)) => HttpResponse::Ok().json(ApiSession {
            user: grant.user,
            expires: grant.expires_at.to_rfc3339(),
            redirect: None,
        }),
        Ok(None) => HttpResponse::Unauthorized()
            .cookie(removal_cookie(SESSION_COOKIE))
            .json(ApiError::new("No active session")),
        Err(e) => auth_error_response(&e),
    }
}

/// `POST /api/auth/signout`
pub async fn sign_out(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Some(token) = session_token(&req) {
        if let Err(e) = state.auth.sign_out(&token).await {
            return auth_error_response(&e);
        }
    }

    HttpResponse::Ok()
        .cookie(removal_cookie(SESSION_COOKIE))
        .json(ApiMessage {
            message: "Signed out".to_string(),
        })
}

fn oauth_provider(name: &str) -> Result<AuthProvider, AuthError> {
    match name.parse::<AuthProvider>() {
        Ok(AuthProvider::Credentials) | Err(_) => Err(AuthError::OAuthSignin {
            provider: name.to_string(),
        }),
        Ok(provider) => Ok(provider),
    }
}

fn auth_error_response(err: &AuthError) -> HttpResponse {
    if err.is_client_error() {
        log::debug!("Authentication rejected: {}", err.code());
    } else {
        log::error!("Authentication error: {err}");
    }

    let mut response = match err {
        AuthError::MissingFields
        | AuthError::PasswordMismatch
        | AuthError::OAuthSignin { .. }
        | AuthError::OAuthCallback { .. } => HttpResponse::BadRequest(),
        AuthError::EmailInUse | AuthError::OAuthAccountNotLinked => HttpResponse::Conflict(),
        AuthError::AccessDenied => HttpResponse::Forbidden(),
        AuthError::CredentialsSignin => HttpResponse::Unauthorized(),
        AuthError::Storage(_) | AuthError::Config { .. } => HttpResponse::InternalServerError(),
    };
    response.json(ApiError::from(err))
}

/// Reads the session token from the cookie, or from an
/// `Authorization: Bearer` header for non-browser clients.
fn session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string())
        })
        .filter(|t| !t.is_empty())
}

fn secure_cookies(state: &AppState) -> bool {
    state.auth.config().base_url().starts_with("https://")
}

fn session_cookie(state: &AppState, token: &str) -> Cookie<'static> {
    let max_age = state.auth.config().session_ttl.num_seconds();
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure_cookies(state))
        .max_age(actix_web::cookie::time::Duration::seconds(max_age))
        .finish()
}

fn flow_cookie(state: &AppState, name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/api/auth")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure_cookies(state))
        .max_age(actix_web::cookie::time::Duration::minutes(10))
        .finish()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let path = if name == SESSION_COOKIE { "/" } else { "/api/auth" };
    let mut cookie = Cookie::build(name, "").path(path).finish();
    cookie.make_removal();
    cookie
}

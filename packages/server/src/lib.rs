#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for galamsey watch.
//!
//! Accepts submitted reports, serves them back to reviewers, proxies
//! place-name lookups to the geocoder, lists mining licenses, and handles
//! account sign-in. Everything is stored in a single `SQLite` file.

mod handlers;
pub mod interactive;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use galamsey_watch_auth::oauth::GoogleOAuth;
use galamsey_watch_auth::repository::SqlAuthRepository;
use galamsey_watch_auth::{AuthConfig, AuthService};
use galamsey_watch_database::{db, licenses};
use galamsey_watch_geocoder::LocationResolver;
use galamsey_watch_license_models::LicenseQuery;
use switchy_database::Database;

pub use handlers::SESSION_COOKIE;

/// Shared application state.
pub struct AppState {
    /// Reports, accounts and the license directory.
    pub db: Arc<dyn Database>,
    pub auth: AuthService,
    pub resolver: LocationResolver,
}

impl AppState {
    /// Builds the state from a database and its environment-driven
    /// collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth or geocoder configuration is invalid.
    pub fn from_env(db: Arc<dyn Database>) -> std::io::Result<Self> {
        let config = AuthConfig::from_env().map_err(std::io::Error::other)?;
        let google = config.google.clone();
        let mut auth = AuthService::new(config, Arc::new(SqlAuthRepository::new(db.clone())));

        if let Some(credentials) = google {
            log::info!("Google sign-in enabled");
            auth = auth.with_google(Arc::new(GoogleOAuth::new(
                reqwest::Client::new(),
                credentials,
            )));
        }

        let resolver = LocationResolver::from_env().map_err(std::io::Error::other)?;

        Ok(Self { db, auth, resolver })
    }
}

/// Registers every API route under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/reports", web::post().to(handlers::submit_report))
            .route("/reports", web::get().to(handlers::get_reports))
            .route(
                "/reports/status",
                web::post().to(handlers::update_report_status),
            )
            .route("/geocode", web::get().to(handlers::geocode))
            .route("/licenses", web::get().to(handlers::list_licenses))
            .route("/auth/register", web::post().to(handlers::register))
            .route(
                "/auth/signin/credentials",
                web::post().to(handlers::sign_in_credentials),
            )
            .route(
                "/auth/signin/{provider}",
                web::get().to(handlers::sign_in_oauth),
            )
            .route(
                "/auth/callback/{provider}",
                web::get().to(handlers::oauth_callback),
            )
            .route("/auth/session", web::get().to(handlers::session))
            .route("/auth/signout", web::post().to(handlers::sign_out)),
    );
}

/// Seeds the license directory when it is empty.
async fn ensure_licenses(db: &dyn Database) -> std::io::Result<()> {
    let existing = licenses::list_licenses(db, &LicenseQuery::default())
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    if existing.is_empty() {
        let count = licenses::seed_licenses(db)
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        log::info!("Seeded {count} mining licenses");
    }
    Ok(())
}

/// Starts the galamsey watch API server.
///
/// Opens the database at `DATABASE_PATH`, seeds the license directory on
/// first run, and serves on `BIND_ADDR`:`PORT`. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened,
/// the configuration is invalid, or the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Opening database at {}...", db::db_path_from_env().display());
    let database: Arc<dyn Database> = Arc::from(
        db::open_from_env()
            .await
            .map_err(|e| std::io::Error::other(e.to_string()))?,
    );

    ensure_licenses(database.as_ref()).await?;

    let state = web::Data::new(AppState::from_env(database)?);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

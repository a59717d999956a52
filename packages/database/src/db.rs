//! Database connection and schema.

use std::path::{Path, PathBuf};

use switchy_database::Database;
use switchy_database_connection::init_sqlite_rusqlite;

use crate::DbError;

/// Default location of the database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/galamsey_watch.db";

/// Returns the database path from `DATABASE_PATH`, or [`DEFAULT_DB_PATH`].
#[must_use]
pub fn db_path_from_env() -> PathBuf {
    std::env::var("DATABASE_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from)
}

/// Opens (or creates) the database at `path` and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the directory cannot be created, the file cannot
/// be opened, or schema creation fails.
pub async fn open_db(path: &Path) -> Result<Box<dyn Database>, DbError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = init_sqlite_rusqlite(Some(path)).map_err(|e| DbError::Connection(e.to_string()))?;

    ensure_schema(db.as_ref()).await?;
    log::debug!("Opened database at {}", path.display());

    Ok(db)
}

/// Opens the database at the path from [`db_path_from_env`].
///
/// # Errors
///
/// See [`open_db`].
pub async fn open_from_env() -> Result<Box<dyn Database>, DbError> {
    open_db(&db_path_from_env()).await
}

async fn ensure_schema(db: &dyn Database) -> Result<(), DbError> {
    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS reports (
            report_id            TEXT PRIMARY KEY,
            report_type          TEXT NOT NULL,
            threat_level         INTEGER NOT NULL,
            mining_activity_type TEXT,
            incident_description TEXT NOT NULL,
            location_lat         REAL,
            location_lng         REAL,
            location_description TEXT NOT NULL,
            evidence_files       TEXT NOT NULL,
            blur_faces           INTEGER NOT NULL,
            strip_location       INTEGER NOT NULL,
            user_agent           TEXT NOT NULL,
            status               TEXT NOT NULL,
            created_at           TEXT NOT NULL,
            updated_at           TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw("CREATE INDEX IF NOT EXISTS idx_reports_created ON reports (created_at)")
        .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS users (
            id            TEXT PRIMARY KEY,
            name          TEXT NOT NULL,
            email         TEXT NOT NULL UNIQUE,
            password_hash TEXT,
            provider      TEXT NOT NULL,
            created_at    TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS sessions (
            token      TEXT PRIMARY KEY,
            user_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw(
        "CREATE TABLE IF NOT EXISTS mining_licenses (
            license_id       TEXT PRIMARY KEY,
            license_type     TEXT NOT NULL,
            company_name     TEXT NOT NULL,
            company_type     TEXT NOT NULL,
            region           TEXT NOT NULL,
            district         TEXT NOT NULL,
            status           TEXT NOT NULL,
            area_description TEXT NOT NULL,
            latitude         REAL NOT NULL,
            longitude        REAL NOT NULL,
            area_size        TEXT NOT NULL,
            contact_name     TEXT NOT NULL,
            contact_position TEXT NOT NULL,
            contact_email    TEXT NOT NULL,
            contact_phone    TEXT NOT NULL,
            document_files   TEXT NOT NULL
        )",
    )
    .await?;

    db.exec_raw("PRAGMA foreign_keys = ON").await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Opens a fresh database in a unique temp file.
    pub async fn temp_db() -> Box<dyn Database> {
        let path = std::env::temp_dir()
            .join("galamsey_watch_tests")
            .join(format!("{}.db", uuid::Uuid::new_v4()));
        open_db(&path).await.unwrap()
    }
}

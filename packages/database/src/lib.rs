#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `SQLite` storage for galamsey watch.
//!
//! One database file holds submitted reports, user accounts, sign-in
//! sessions and the mining license directory. All access goes through
//! `switchy_database` with raw parameterized SQL.

pub mod db;
pub mod licenses;
pub mod reports;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// The database file could not be opened.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Creating the data directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON column could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The embedded seed file is invalid.
    #[error("Seed data error: {0}")]
    Seed(#[from] toml::de::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

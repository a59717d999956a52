//! Interactive mode for the server.
//!
//! Prompts for the listen address, the database file and the public base
//! URL before starting the server.

use dialoguer::{Confirm, Input};

fn prompt(label: &str, env_key: &str, default: &str) -> String {
    let current = std::env::var(env_key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string());

    Input::new()
        .with_prompt(label)
        .default(current.clone())
        .interact_text()
        .unwrap_or(current)
}

/// Runs the server in interactive mode, prompting for configuration.
///
/// Sets `BIND_ADDR`, `PORT`, `DATABASE_PATH` and `GALAMSEY_WATCH_BASE_URL`
/// from the answers and delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Galamsey Watch Server");
    println!();

    let bind_addr = prompt("Bind address", "BIND_ADDR", "127.0.0.1");
    let port = prompt("Port", "PORT", "8080");
    let db_path = prompt(
        "Database file",
        "DATABASE_PATH",
        galamsey_watch_database::db::DEFAULT_DB_PATH,
    );
    let base_url = prompt(
        "Public base URL",
        "GALAMSEY_WATCH_BASE_URL",
        &format!("http://{bind_addr}:{port}"),
    );

    // SAFETY: no other threads exist yet, and these are read once during
    // server start-up.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port);
        std::env::set_var("DATABASE_PATH", &db_path);
        std::env::set_var("GALAMSEY_WATCH_BASE_URL", &base_url);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front end for galamsey watch.
//!
//! ```text
//! galamsey_watch report [--server URL] [--position LAT,LNG]
//! galamsey_watch reports [--status STATUS]
//! galamsey_watch set-status <ID> <STATUS>
//! galamsey_watch licenses [--status STATUS] [--region REGION]
//! galamsey_watch seed-licenses
//! galamsey_watch register
//! galamsey_watch server
//! ```
//!
//! Running with no subcommand enters interactive mode.

mod admin;
mod wizard;

use clap::{Parser, Subcommand};
use dialoguer::Select;
use galamsey_watch_wizard::FixedPositionProvider;

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "galamsey_watch", about = "Report and review illegal mining activity")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// File a report through the step-by-step wizard
    Report {
        /// Server that receives the report
        #[arg(long, env = "GALAMSEY_WATCH_SERVER", default_value = DEFAULT_SERVER_URL)]
        server: String,
        /// Device position offered by "Use current position", as "lat,lng"
        #[arg(long)]
        position: Option<FixedPositionProvider>,
    },
    /// List stored reports, newest first
    Reports {
        /// Only show reports with this status
        #[arg(long)]
        status: Option<String>,
    },
    /// Change the review status of a report
    SetStatus {
        /// Report ID (e.g. ID-AB12CD34)
        id: String,
        /// pending, under-review, verified, resolved or dismissed
        status: String,
    },
    /// List mining licenses
    Licenses {
        /// active, pending, revoked or expired
        #[arg(long)]
        status: Option<String>,
        /// Region name, case-insensitive
        #[arg(long)]
        region: Option<String>,
    },
    /// Replace the license directory with the bundled seed data
    SeedLicenses,
    /// Create an email and password account
    Register,
    /// Start the API server
    Server,
}

/// Top-level tool selection for interactive mode.
enum Tool {
    Report,
    Reports,
    Licenses,
    SeedLicenses,
    Register,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::Report,
        Self::Reports,
        Self::Licenses,
        Self::SeedLicenses,
        Self::Register,
        Self::Server,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Report => "File a report",
            Self::Reports => "Review stored reports",
            Self::Licenses => "Browse mining licenses",
            Self::SeedLicenses => "Seed license directory",
            Self::Register => "Create an account",
            Self::Server => "Start server",
        }
    }
}

fn run_server_blocking() -> std::io::Result<()> {
    actix_web::rt::System::new().block_on(galamsey_watch_server::interactive::run())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Galamsey Watch");
        println!();

        let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Tool::ALL[idx] {
            Tool::Report => wizard::run(DEFAULT_SERVER_URL, None).await?,
            Tool::Reports => admin::review_interactive().await?,
            Tool::Licenses => admin::list_licenses(None, None).await?,
            Tool::SeedLicenses => admin::seed_licenses().await?,
            Tool::Register => admin::register().await?,
            Tool::Server => {
                // actix-web brings its own runtime, so it cannot nest inside
                // the tokio one.
                tokio::task::spawn_blocking(run_server_blocking).await??;
            }
        }
        return Ok(());
    };

    match command {
        Commands::Report { server, position } => wizard::run(&server, position).await?,
        Commands::Reports { status } => admin::list_reports(status.as_deref()).await?,
        Commands::SetStatus { id, status } => admin::set_status(&id, &status).await?,
        Commands::Licenses { status, region } => {
            admin::list_licenses(status.as_deref(), region).await?;
        }
        Commands::SeedLicenses => admin::seed_licenses().await?,
        Commands::Register => admin::register().await?,
        Commands::Server => tokio::task::spawn_blocking(run_server_blocking).await??,
    }

    Ok(())
}

//! Review and maintenance commands that work on the local database.

use std::sync::Arc;

use dialoguer::{Input, Password, Select};
use galamsey_watch_auth::repository::SqlAuthRepository;
use galamsey_watch_auth::service::confirm_password;
use galamsey_watch_auth::{AuthConfig, AuthService, Registration};
use galamsey_watch_database::{db, licenses, reports};
use galamsey_watch_license_models::{LicenseQuery, LicenseStatus, MiningLicense};
use galamsey_watch_report_models::{ReportStatus, StoredReport};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn parse_report_status(status: &str) -> Result<ReportStatus, String> {
    status
        .trim()
        .parse()
        .map_err(|_| format!("Unknown report status: {status}"))
}

fn report_row(report: &StoredReport) -> String {
    let record = &report.record;
    let place = if record.location_description.is_empty() {
        match (record.location_lat, record.location_lng) {
            (Some(lat), Some(lng)) => format!("{lat:.4}, {lng:.4}"),
            _ => "(no location)".to_string(),
        }
    } else {
        record.location_description.clone()
    };
    let created = report.created_at.get(..19).unwrap_or(&report.created_at);

    format!(
        "{:<12} {:<13} {:<6} {:<20} {}",
        record.report_id,
        report.status.as_ref(),
        record.threat_level.value(),
        created,
        place
    )
}

fn license_row(license: &MiningLicense) -> String {
    format!(
        "{:<14} {:<8} {:<7} {:<11} {:<16} {}",
        license.license_id,
        license.status.as_ref(),
        if license.status.permits_mining() { "yes" } else { "no" },
        license.license_type.as_ref(),
        license.region,
        license.company_name
    )
}

/// Prints stored reports, optionally filtered by status.
pub async fn list_reports(status: Option<&str>) -> CliResult {
    let status = status.map(parse_report_status).transpose()?;
    let db = db::open_from_env().await?;
    let all = reports::get_all_reports(db.as_ref()).await?;
    let shown: Vec<&StoredReport> = all
        .iter()
        .filter(|r| status.is_none_or(|s| r.status == s))
        .collect();

    if shown.is_empty() {
        println!("No reports found.");
        return Ok(());
    }

    println!(
        "{:<12} {:<13} {:<6} {:<20} LOCATION",
        "ID", "STATUS", "THREAT", "CREATED"
    );
    println!("{}", "-".repeat(90));
    for report in &shown {
        println!("{}", report_row(report));
    }
    println!("\n{} report(s)", shown.len());
    Ok(())
}

/// Changes one report's review status.
pub async fn set_status(id: &str, status: &str) -> CliResult {
    let status = parse_report_status(status)?;
    let db = db::open_from_env().await?;

    if reports::update_report_status(db.as_ref(), id, status).await? {
        println!("Report {id} is now {status}");
        Ok(())
    } else {
        Err(format!("Report not found: {id}").into())
    }
}

/// Lists reports and lets the reviewer change their status.
pub async fn review_interactive() -> CliResult {
    let db = db::open_from_env().await?;

    loop {
        let all = reports::get_all_reports(db.as_ref()).await?;
        if all.is_empty() {
            println!("No reports found.");
            return Ok(());
        }

        let mut items: Vec<String> = all.iter().map(report_row).collect();
        items.push("Done".to_string());
        let idx = Select::new()
            .with_prompt("Select a report")
            .items(&items)
            .default(0)
            .interact()?;
        let Some(report) = all.get(idx) else {
            return Ok(());
        };

        println!("\n{}\n", report.record.incident_description);

        let statuses = [
            ReportStatus::Pending,
            ReportStatus::UnderReview,
            ReportStatus::Verified,
            ReportStatus::Resolved,
            ReportStatus::Dismissed,
        ];
        let labels: Vec<&str> = statuses.iter().map(AsRef::as_ref).collect();
        let current = statuses.iter().position(|s| *s == report.status).unwrap_or(0);
        let choice = Select::new()
            .with_prompt("Status")
            .items(&labels)
            .default(current)
            .interact()?;

        let id = report.record.report_id.as_str();
        reports::update_report_status(db.as_ref(), id, statuses[choice]).await?;
        println!("Report {id} is now {}", statuses[choice]);
    }
}

/// Prints the license directory.
pub async fn list_licenses(status: Option<&str>, region: Option<String>) -> CliResult {
    let status = status
        .map(|s| {
            s.parse::<LicenseStatus>()
                .map_err(|_| format!("Unknown license status: {s}"))
        })
        .transpose()?;
    let db = db::open_from_env().await?;
    let found = licenses::list_licenses(db.as_ref(), &LicenseQuery { status, region }).await?;

    if found.is_empty() {
        println!("No licenses found. Run `seed-licenses` to load the directory.");
        return Ok(());
    }

    println!(
        "{:<14} {:<8} {:<7} {:<11} {:<16} COMPANY",
        "LICENSE", "STATUS", "MINING", "SCALE", "REGION"
    );
    println!("{}", "-".repeat(90));
    for license in &found {
        println!("{}", license_row(license));
    }
    println!("\n{} license(s)", found.len());
    Ok(())
}

/// Replaces the license table with the bundled seed data.
pub async fn seed_licenses() -> CliResult {
    let db = db::open_from_env().await?;
    let count = licenses::seed_licenses(db.as_ref()).await?;
    println!("Seeded {count} licenses into {}", db::db_path_from_env().display());
    Ok(())
}

/// Creates a password account in the local database.
pub async fn register() -> CliResult {
    let name: String = Input::new().with_prompt("Name").interact_text()?;
    let email: String = Input::new().with_prompt("Email").interact_text()?;
    let password = Password::new().with_prompt("Password").interact()?;
    let confirmation = Password::new().with_prompt("Confirm password").interact()?;
    confirm_password(&password, &confirmation).map_err(|e| e.user_message().to_string())?;

    let db: Arc<dyn switchy_database::Database> = Arc::from(db::open_from_env().await?);
    let auth = AuthService::new(
        AuthConfig::from_env()?,
        Arc::new(SqlAuthRepository::new(db)),
    );

    let user = auth
        .register(&Registration {
            name,
            email,
            password,
        })
        .await
        .map_err(|e| e.user_message().to_string())?;
    println!("Registered {} <{}>", user.name, user.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use galamsey_watch_report_models::{ReportId, ReportRecord, ReportType, ThreatLevel};

    fn stored(location_description: &str) -> StoredReport {
        StoredReport {
            record: ReportRecord {
                report_id: ReportId::parse("ID-AB12CD34").unwrap(),
                report_type: ReportType::Citizen,
                threat_level: ThreatLevel::default(),
                mining_activity_type: None,
                incident_description: String::new(),
                location_lat: Some(5.3),
                location_lng: Some(-1.99),
                location_description: location_description.to_string(),
                evidence_files: Vec::new(),
                blur_faces: true,
                strip_location: true,
                user_agent: String::new(),
            },
            status: ReportStatus::UnderReview,
            created_at: "2026-03-01T10:00:00.123+00:00".to_string(),
            updated_at: "2026-03-01T10:00:00.123+00:00".to_string(),
        }
    }

    #[test]
    fn report_rows_fall_back_to_coordinates() {
        let row = report_row(&stored(""));
        assert!(row.starts_with("ID-AB12CD34"));
        assert!(row.contains("under-review"));
        assert!(row.contains("2026-03-01T10:00:00 "));
        assert!(row.ends_with("5.3000, -1.9900"));

        assert!(report_row(&stored("Tarkwa")).ends_with("Tarkwa"));
    }

    #[test]
    fn license_rows_show_whether_mining_is_allowed() {
        let seeds = galamsey_watch_database::licenses::seed_data().unwrap();
        let active = seeds
            .iter()
            .find(|l| l.status == LicenseStatus::Active)
            .unwrap();
        let revoked = seeds
            .iter()
            .find(|l| l.status == LicenseStatus::Revoked)
            .unwrap();

        assert!(license_row(active).contains(" active   yes "));
        assert!(license_row(revoked).contains(" revoked  no "));
    }

    #[test]
    fn report_status_names_are_checked() {
        assert_eq!(parse_report_status(" verified "), Ok(ReportStatus::Verified));
        assert!(parse_report_status("closed").is_err());
    }
}

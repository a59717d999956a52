//! Terminal rendition of the four-step report wizard.

use std::path::Path;
use std::sync::Arc;

use dialoguer::{Confirm, Input, Select};
use galamsey_watch_geocoder::LocationResolver;
use galamsey_watch_report_models::{EvidenceFile, MiningActivityType, ReportType, ThreatLevel};
use galamsey_watch_wizard::{
    FixedPositionProvider, HttpSubmissionGateway, PositionProvider, Step, Transition,
    WizardController, WizardState,
};

/// Runs the wizard until the reporter stops filing reports.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or the geocoder is
/// misconfigured. Failed submissions are not errors.
pub async fn run(
    server: &str,
    position: Option<FixedPositionProvider>,
) -> Result<(), Box<dyn std::error::Error>> {
    let gateway = Arc::new(HttpSubmissionGateway::new(reqwest::Client::new(), server));
    log::debug!("Submitting to {}", gateway.endpoint());

    let resolver = LocationResolver::from_env()?;
    let mut wizard = WizardController::new(
        gateway,
        format!("galamsey_watch_cli/{}", env!("CARGO_PKG_VERSION")),
    );
    let position = position.as_ref().map(|p| p as &dyn PositionProvider);

    loop {
        let WizardState::Editing(step) = wizard.state() else {
            if Confirm::new()
                .with_prompt("File another report?")
                .default(false)
                .interact()?
            {
                wizard.reset();
                continue;
            }
            return Ok(());
        };

        println!();
        println!(
            "Step {} of 4: {} [{}%]",
            step.number(),
            step.title(),
            wizard.progress_percent()
        );

        match step {
            Step::ReportType => prompt_report_type(&mut wizard)?,
            Step::IncidentDetails => prompt_details(&mut wizard)?,
            Step::Location => prompt_location(&mut wizard, &resolver, position).await?,
            Step::Evidence => prompt_evidence(&mut wizard)?,
        }

        let forward = if step == Step::Evidence {
            "Submit report"
        } else {
            "Continue"
        };
        let mut actions = vec![forward];
        if step != Step::FIRST {
            actions.push("Back");
        }
        let choice = Select::new().items(&actions).default(0).interact()?;

        let transition = if choice == 0 {
            wizard.next().await
        } else {
            wizard.back()
        };

        match transition {
            Transition::Blocked(e) => println!("  ! {e}"),
            Transition::Submitted(id) => {
                println!();
                println!("Report submitted. Your confirmation ID is {id}");
                println!("Keep it to follow up on your report.");
                if wizard.last_submission_persisted() == Some(false) {
                    log::warn!("Report {id} was not stored by the server");
                }
            }
            Transition::Advanced(_) | Transition::Unchanged => {}
        }
    }
}

fn prompt_report_type(wizard: &mut WizardController) -> dialoguer::Result<()> {
    let labels: Vec<&str> = ReportType::all().iter().map(|t| t.label()).collect();
    let current = wizard
        .draft()
        .report_type
        .and_then(|t| ReportType::all().iter().position(|x| *x == t))
        .unwrap_or(0);

    let idx = Select::new()
        .with_prompt("Who is filing this report?")
        .items(&labels)
        .default(current)
        .interact()?;
    wizard.select_report_type(ReportType::all()[idx]);
    Ok(())
}

fn prompt_details(wizard: &mut WizardController) -> dialoguer::Result<()> {
    let levels: Vec<&str> = ThreatLevel::all().iter().map(|l| l.label()).collect();
    let current = usize::from(wizard.draft().threat_level.value());
    let idx = Select::new()
        .with_prompt("Threat level")
        .items(&levels)
        .default(current)
        .interact()?;
    wizard.set_threat_level(ThreatLevel::all()[idx]);

    let mut activities = vec!["Not sure"];
    activities.extend(MiningActivityType::all().iter().map(|a| a.label()));
    let idx = Select::new()
        .with_prompt("Type of mining activity")
        .items(&activities)
        .default(0)
        .interact()?;
    wizard.set_mining_activity_type(
        idx.checked_sub(1)
            .map(|i| MiningActivityType::all()[i]),
    );

    let description: String = Input::new()
        .with_prompt("Describe what you saw")
        .allow_empty(true)
        .with_initial_text(wizard.draft().incident_description())
        .interact_text()?;
    wizard.set_incident_description(&description);
    Ok(())
}

async fn prompt_location(
    wizard: &mut WizardController,
    resolver: &LocationResolver,
    position: Option<&dyn PositionProvider>,
) -> dialoguer::Result<()> {
    if let Some(location) = wizard.draft().location {
        println!(
            "  Current location: {:.4}, {:.4} {}",
            location.lat,
            location.lng,
            wizard.draft().location_label
        );
    }

    let methods = [
        "Search for a place",
        "Enter coordinates",
        "Use current position",
        "Keep as is",
    ];
    let idx = Select::new()
        .with_prompt("How do you want to set the location?")
        .items(&methods)
        .default(0)
        .interact()?;

    match idx {
        0 => search_location(wizard, resolver).await?,
        1 => {
            let lat: String = Input::new().with_prompt("Latitude").interact_text()?;
            let lng: String = Input::new().with_prompt("Longitude").interact_text()?;
            if let Err(e) = wizard
                .enter_latitude(&lat)
                .and_then(|()| wizard.enter_longitude(&lng))
            {
                println!("  ! {e}");
                return Ok(());
            }
            let label: String = Input::new()
                .with_prompt("Place name (optional)")
                .allow_empty(true)
                .interact_text()?;
            wizard.set_location_label(&label);
        }
        2 => {
            if wizard.use_current_position(position).await.is_none() {
                if let Some(message) = wizard.location_message() {
                    println!("  ! {message}");
                }
            }
        }
        _ => {}
    }
    Ok(())
}

async fn search_location(
    wizard: &mut WizardController,
    resolver: &LocationResolver,
) -> dialoguer::Result<()> {
    let query: String = Input::new()
        .with_prompt("Town, village or landmark")
        .with_initial_text(wizard.search_query())
        .interact_text()?;
    wizard.set_search_query(&query);
    wizard.search(resolver).await;

    let results = wizard.search_results().to_vec();
    if results.is_empty() {
        println!("  No places to choose from.");
        return Ok(());
    }

    let labels: Vec<&str> = results.iter().map(|r| r.label.as_str()).collect();
    let idx = Select::new()
        .with_prompt("Pick a place")
        .items(&labels)
        .default(results.iter().position(|r| r.is_selectable()).unwrap_or(0))
        .interact()?;

    if let Err(e) = wizard.select_search_result(&results[idx]) {
        println!("  ! {e}");
    }
    Ok(())
}

fn prompt_evidence(wizard: &mut WizardController) -> dialoguer::Result<()> {
    loop {
        let files = wizard.draft().evidence.files();
        if !files.is_empty() {
            println!("  Attached:");
            for (i, file) in files.iter().enumerate() {
                println!("    {}. {} ({} bytes)", i + 1, file.name, file.size_bytes);
            }
        }

        let actions = ["Attach a photo or video", "Remove a file", "Done"];
        match Select::new().items(&actions).default(2).interact()? {
            0 => {
                let path: String = Input::new().with_prompt("File path").interact_text()?;
                match evidence_from_path(Path::new(path.trim())) {
                    Ok(file) => {
                        let outcome = wizard.add_evidence([file]);
                        for rejection in &outcome.rejected {
                            println!("  ! {}: {}", rejection.name, rejection.reason);
                        }
                        if outcome.over_capacity {
                            println!("  ! You can attach at most 5 files");
                        }
                    }
                    Err(e) => println!("  ! Cannot read {path}: {e}"),
                }
            }
            1 => {
                let index: usize = Input::new().with_prompt("File number").interact_text()?;
                if index == 0 || wizard.remove_evidence(index - 1).is_none() {
                    println!("  ! No file number {index}");
                }
            }
            _ => break,
        }
    }

    let privacy = wizard.draft().evidence.privacy();
    let blur = Confirm::new()
        .with_prompt("Blur faces in photos?")
        .default(privacy.blur_faces)
        .interact()?;
    wizard.set_blur_faces(blur);
    let strip = Confirm::new()
        .with_prompt("Remove location data from files?")
        .default(privacy.strip_location_metadata)
        .interact()?;
    wizard.set_strip_location_metadata(strip);
    Ok(())
}

/// Describes a file on disk for attachment. Only the name and size are
/// read; the type is judged from the extension.
fn evidence_from_path(path: &Path) -> std::io::Result<EvidenceFile> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(std::io::Error::other("not a regular file"));
    }
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    Ok(EvidenceFile {
        name,
        size_bytes: metadata.len(),
        content_type: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evidence_is_described_from_disk() {
        let dir = std::env::temp_dir().join(format!("galamsey_watch_cli_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("river.jpg");
        std::fs::write(&path, [0_u8; 2048]).unwrap();

        let file = evidence_from_path(&path).unwrap();
        assert_eq!(file.name, "river.jpg");
        assert_eq!(file.size_bytes, 2048);
        assert!(galamsey_watch_wizard::evidence::is_media(&file));

        assert!(evidence_from_path(&dir).is_err());
        assert!(evidence_from_path(&dir.join("missing.mp4")).is_err());
    }
}

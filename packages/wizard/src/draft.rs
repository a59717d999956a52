//! The in-progress report accumulated across wizard steps.

use galamsey_watch_report_models::{
    Coordinates, MiningActivityType, ReportId, ReportRecord, ReportType, ThreatLevel,
};

use crate::ValidationError;
use crate::evidence::EvidenceCollector;

/// Maximum length of the incident description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Every field collected by the wizard, serialized once at submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    /// Reporter type, required before leaving step 1.
    pub report_type: Option<ReportType>,
    /// Severity, defaults to [`ThreatLevel::Medium`].
    pub threat_level: ThreatLevel,
    /// Observed activity, no default.
    pub mining_activity_type: Option<MiningActivityType>,
    incident_description: String,
    /// Incident location, required before leaving step 3.
    pub location: Option<Coordinates>,
    /// Place name associated with `location`, may be empty.
    pub location_label: String,
    /// Attached files and privacy toggles.
    pub evidence: EvidenceCollector,
    /// Assigned only when submission is attempted.
    pub report_id: Option<ReportId>,
}

impl ReportDraft {
    /// Creates an empty draft with default threat level and privacy flags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The incident description.
    #[must_use]
    pub fn incident_description(&self) -> &str {
        &self.incident_description
    }

    /// Sets the incident description, truncated to
    /// [`MAX_DESCRIPTION_CHARS`] characters.
    pub fn set_incident_description(&mut self, text: &str) {
        self.incident_description = match text.char_indices().nth(MAX_DESCRIPTION_CHARS) {
            Some((cut, _)) => text[..cut].to_string(),
            None => text.to_string(),
        };
    }

    /// Flattens the draft into the persistence record.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ReportTypeRequired`] if no reporter type
    /// has been chosen.
    pub fn to_record(
        &self,
        report_id: ReportId,
        user_agent: &str,
    ) -> Result<ReportRecord, ValidationError> {
        let report_type = self
            .report_type
            .ok_or(ValidationError::ReportTypeRequired)?;
        let privacy = self.evidence.privacy();

        Ok(ReportRecord {
            report_id,
            report_type,
            threat_level: self.threat_level,
            mining_activity_type: self.mining_activity_type,
            incident_description: self.incident_description.clone(),
            location_lat: self.location.map(|c| c.lat),
            location_lng: self.location.map(|c| c.lng),
            location_description: self.location_label.clone(),
            evidence_files: self
                .evidence
                .files()
                .iter()
                .map(|f| f.name.clone())
                .collect(),
            blur_faces: privacy.blur_faces,
            strip_location: privacy.strip_location_metadata,
            user_agent: user_agent.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use galamsey_watch_report_models::EvidenceFile;

    use super::*;

    #[test]
    fn new_draft_has_documented_defaults() {
        let draft = ReportDraft::new();
        assert!(draft.report_type.is_none());
        assert_eq!(draft.threat_level.value(), 2);
        assert!(draft.mining_activity_type.is_none());
        assert!(draft.location.is_none());
        assert!(draft.evidence.files().is_empty());
        assert!(draft.evidence.privacy().blur_faces);
        assert!(draft.evidence.privacy().strip_location_metadata);
        assert!(draft.report_id.is_none());
    }

    #[test]
    fn description_is_truncated_on_char_boundary() {
        let mut draft = ReportDraft::new();
        let long: String = "é".repeat(MAX_DESCRIPTION_CHARS + 10);
        draft.set_incident_description(&long);
        assert_eq!(draft.incident_description().chars().count(), MAX_DESCRIPTION_CHARS);

        draft.set_incident_description("Excavators on the Pra river bank");
        assert_eq!(draft.incident_description(), "Excavators on the Pra river bank");
    }

    #[test]
    fn record_requires_report_type() {
        let draft = ReportDraft::new();
        assert_eq!(
            draft.to_record(ReportId::generate(), "test"),
            Err(ValidationError::ReportTypeRequired)
        );
    }

    #[test]
    fn record_flattens_all_fields() {
        let mut draft = ReportDraft::new();
        draft.report_type = Some(ReportType::Official);
        draft.mining_activity_type = Some(MiningActivityType::Riverbed);
        draft.location = Some(Coordinates::new(5.3018, -1.9886));
        draft.location_label = "Tarkwa Gold Mine".to_string();
        draft.evidence.add([EvidenceFile {
            name: "pit.jpg".to_string(),
            size_bytes: 1024,
            content_type: Some("image/jpeg".to_string()),
        }]);
        draft.evidence.set_blur_faces(false);

        let id = ReportId::parse("ID-ABCD1234").unwrap();
        let record = draft.to_record(id.clone(), "galamsey-watch-cli/0.1").unwrap();
        assert_eq!(record.report_id, id);
        assert_eq!(record.location_lat, Some(5.3018));
        assert_eq!(record.location_lng, Some(-1.9886));
        assert_eq!(record.location_description, "Tarkwa Gold Mine");
        assert_eq!(record.evidence_files, ["pit.jpg"]);
        assert!(!record.blur_faces);
        assert!(record.strip_location);
        assert_eq!(record.user_agent, "galamsey-watch-cli/0.1");
    }
}

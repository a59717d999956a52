#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident report types shared across the galamsey watch system.
//!
//! Defines the enums collected by the report wizard (reporter type, threat
//! level, mining activity), the geocoding [`SearchResult`] consumed by the
//! location step, and the flat [`ReportRecord`] handed to persistence.

use rand::Rng as _;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Who is filing the report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReportType {
    /// A member of the public reporting under their own name
    Citizen,
    /// A government or traditional-authority official
    Official,
    /// A tip with no reporter identity attached
    AnonymousTip,
}

impl ReportType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Citizen, Self::Official, Self::AnonymousTip]
    }

    /// Human-readable label for selection lists.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Citizen => "Concerned citizen",
            Self::Official => "Government or community official",
            Self::AnonymousTip => "Anonymous tip",
        }
    }
}

/// Ordinal severity of the reported activity, from 0 (very low) to 4
/// (very high).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum ThreatLevel {
    /// Level 0
    VeryLow = 0,
    /// Level 1
    Low = 1,
    /// Level 2, the wizard default
    #[default]
    Medium = 2,
    /// Level 3
    High = 3,
    /// Level 4
    VeryHigh = 4,
}

impl ThreatLevel {
    /// Returns the numeric value of this threat level.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a threat level from a numeric value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 0-4.
    pub const fn from_value(value: u8) -> Result<Self, InvalidThreatLevelError> {
        match value {
            0 => Ok(Self::VeryLow),
            1 => Ok(Self::Low),
            2 => Ok(Self::Medium),
            3 => Ok(Self::High),
            4 => Ok(Self::VeryHigh),
            _ => Err(InvalidThreatLevelError { value }),
        }
    }

    /// Display label shown next to the severity slider.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    /// Returns all variants in ascending order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::VeryLow,
            Self::Low,
            Self::Medium,
            Self::High,
            Self::VeryHigh,
        ]
    }
}

impl TryFrom<u8> for ThreatLevel {
    type Error = InvalidThreatLevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<ThreatLevel> for u8 {
    fn from(level: ThreatLevel) -> Self {
        level.value()
    }
}

/// Error returned when attempting to create a [`ThreatLevel`] from an
/// invalid numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidThreatLevelError {
    /// The invalid value that was provided.
    pub value: u8,
}

impl std::fmt::Display for InvalidThreatLevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid threat level {}: expected 0-4", self.value)
    }
}

impl std::error::Error for InvalidThreatLevelError {}

/// The kind of mining activity observed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MiningActivityType {
    /// Dredging or panning in a river bed
    Riverbed,
    /// Forest cleared to open a pit
    #[serde(alias = "forest")]
    #[strum(to_string = "forest-clearing", serialize = "forest")]
    ForestClearing,
    /// Surface excavation
    #[serde(alias = "openpit")]
    #[strum(to_string = "open-pit", serialize = "openpit")]
    OpenPit,
    /// Unauthorized shafts or tunnels
    Underground,
    /// Ore washing or mercury/cyanide processing site
    #[serde(alias = "processing")]
    #[strum(to_string = "processing-facility", serialize = "processing")]
    ProcessingFacility,
    /// Anything else, detailed in the description
    Other,
}

impl MiningActivityType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Riverbed,
            Self::ForestClearing,
            Self::OpenPit,
            Self::Underground,
            Self::ProcessingFacility,
            Self::Other,
        ]
    }

    /// Human-readable label for selection lists.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Riverbed => "Riverbed Mining",
            Self::ForestClearing => "Forest Clearing for Mining",
            Self::OpenPit => "Open-pit Mining",
            Self::Underground => "Unauthorized Underground Mining",
            Self::ProcessingFacility => "Illegal Processing Facility",
            Self::Other => "Other (Specify in Description)",
        }
    }
}

/// Review status of a stored report.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ReportStatus {
    /// Received, not yet looked at
    #[default]
    Pending,
    /// Assigned to an investigator
    UnderReview,
    /// Confirmed on the ground
    Verified,
    /// Enforcement action completed
    Resolved,
    /// Not actionable or a duplicate
    Dismissed,
}

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl Coordinates {
    /// Creates a new coordinate pair.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether this is the `(0, 0)` advisory sentinel.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_null_island(self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }
}

/// A place returned by the location search.
///
/// A result at exactly `(0, 0)` is an advisory header row (e.g. "No exact
/// results") and must never be applied as a report location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Display name of the place.
    pub label: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl SearchResult {
    /// Creates a selectable result.
    #[must_use]
    pub fn new(label: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            label: label.into(),
            lat,
            lng,
        }
    }

    /// Creates a non-selectable advisory row at `(0, 0)`.
    #[must_use]
    pub fn sentinel(label: impl Into<String>) -> Self {
        Self::new(label, 0.0, 0.0)
    }

    /// Returns the coordinates of this result.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    /// Whether this result may be chosen as a report location.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.coordinates().is_null_island()
    }
}

/// An evidence file attached to a report.
///
/// Only metadata is tracked; file contents are never read by the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceFile {
    /// File name as chosen by the reporter.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// MIME type, if known (e.g. `image/jpeg`).
    pub content_type: Option<String>,
}

/// Privacy choices recorded with the report.
///
/// These are recorded as reporter intent. No media processing happens in
/// this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyFlags {
    /// Request that faces be blurred in images and videos.
    pub blur_faces: bool,
    /// Request that GPS metadata be stripped from files.
    pub strip_location_metadata: bool,
}

impl Default for PrivacyFlags {
    fn default() -> Self {
        Self {
            blur_faces: true,
            strip_location_metadata: true,
        }
    }
}

/// Prefix of every report identifier.
pub const REPORT_ID_PREFIX: &str = "ID-";

/// Number of random characters after [`REPORT_ID_PREFIX`].
pub const REPORT_ID_LENGTH: usize = 8;

const REPORT_ID_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Client-facing confirmation identifier, `ID-` followed by eight
/// characters from `[A-Z0-9]`.
///
/// Generated on the client and not guaranteed to be globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportId(String);

impl ReportId {
    /// Generates a new random report identifier.
    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..REPORT_ID_LENGTH)
            .map(|_| {
                let index = rng.random_range(0..REPORT_ID_ALPHABET.len());
                char::from(REPORT_ID_ALPHABET[index])
            })
            .collect();
        Self(format!("{REPORT_ID_PREFIX}{suffix}"))
    }

    /// Parses and validates an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidReportIdError`] if the value does not match
    /// `ID-[A-Z0-9]{8}`.
    pub fn parse(value: &str) -> Result<Self, InvalidReportIdError> {
        let valid = value.strip_prefix(REPORT_ID_PREFIX).is_some_and(|suffix| {
            suffix.len() == REPORT_ID_LENGTH
                && suffix.bytes().all(|b| REPORT_ID_ALPHABET.contains(&b))
        });
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidReportIdError {
                value: value.to_string(),
            })
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl TryFrom<String> for ReportId {
    type Error = InvalidReportIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReportId> for String {
    fn from(id: ReportId) -> Self {
        id.0
    }
}

/// Error returned when a string is not a valid [`ReportId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidReportIdError {
    /// The rejected value.
    pub value: String,
}

impl std::fmt::Display for InvalidReportIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid report id {:?}: expected {REPORT_ID_PREFIX} and {REPORT_ID_LENGTH} of A-Z0-9",
            self.value
        )
    }
}

impl std::error::Error for InvalidReportIdError {}

/// The flat record handed to persistence when a report is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Confirmation identifier shown to the reporter.
    pub report_id: ReportId,
    /// Who filed the report.
    pub report_type: ReportType,
    /// Threat level value (0-4).
    pub threat_level: ThreatLevel,
    /// Observed activity, if the reporter picked one.
    pub mining_activity_type: Option<MiningActivityType>,
    /// Free-text description.
    pub incident_description: String,
    /// Latitude of the incident.
    pub location_lat: Option<f64>,
    /// Longitude of the incident.
    pub location_lng: Option<f64>,
    /// Human-readable place name.
    pub location_description: String,
    /// File names of attached evidence.
    pub evidence_files: Vec<String>,
    /// Reporter asked for faces to be blurred.
    pub blur_faces: bool,
    /// Reporter asked for location metadata to be stripped.
    pub strip_location: bool,
    /// Client user-agent string.
    pub user_agent: String,
}

/// A report as stored, with review metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    /// The submitted record.
    #[serde(flatten)]
    pub record: ReportRecord,
    /// Current review status.
    pub status: ReportStatus,
    /// When the report was stored (RFC 3339).
    pub created_at: String,
    /// When the report was last changed (RFC 3339).
    pub updated_at: String,
}

/// Result of a persistence call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOutcome {
    /// Whether the record was stored.
    pub success: bool,
    /// Failure description when `success` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreOutcome {
    /// A successful outcome.
    #[must_use]
    pub const fn stored() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failed outcome with a reason.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_level_labels_match_slider() {
        let labels: Vec<&str> = ThreatLevel::all().iter().map(|l| l.label()).collect();
        assert_eq!(labels, ["Very Low", "Low", "Medium", "High", "Very High"]);
        assert_eq!(ThreatLevel::default(), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::default().value(), 2);
    }

    #[test]
    fn threat_level_rejects_out_of_range() {
        assert!(ThreatLevel::from_value(4).is_ok());
        assert!(ThreatLevel::from_value(5).is_err());
        assert!(serde_json::from_str::<ThreatLevel>("7").is_err());
        assert_eq!(serde_json::to_string(&ThreatLevel::High).unwrap(), "3");
    }

    #[test]
    fn mining_activity_accepts_legacy_names() {
        assert_eq!(
            "forest".parse::<MiningActivityType>().unwrap(),
            MiningActivityType::ForestClearing
        );
        assert_eq!(
            "open-pit".parse::<MiningActivityType>().unwrap(),
            MiningActivityType::OpenPit
        );
        assert_eq!(MiningActivityType::ProcessingFacility.to_string(), "processing-facility");
        let parsed: MiningActivityType = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(parsed, MiningActivityType::ProcessingFacility);
    }

    #[test]
    fn report_type_uses_kebab_case() {
        assert_eq!(ReportType::AnonymousTip.to_string(), "anonymous-tip");
        assert_eq!("citizen".parse::<ReportType>().unwrap(), ReportType::Citizen);
        assert!("".parse::<ReportType>().is_err());
    }

    #[test]
    fn generated_report_ids_match_pattern() {
        for _ in 0..200 {
            let id = ReportId::generate();
            let s = id.as_str();
            assert_eq!(s.len(), REPORT_ID_PREFIX.len() + REPORT_ID_LENGTH);
            assert!(s.starts_with("ID-"));
            assert!(
                s[3..]
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "bad id {s}"
            );
            assert!(ReportId::parse(s).is_ok());
        }
    }

    #[test]
    fn every_report_id_position_covers_the_alphabet() {
        let mut seen = vec![std::collections::BTreeSet::new(); REPORT_ID_LENGTH];
        for _ in 0..5000 {
            let id = ReportId::generate();
            for (position, b) in id.as_str()[REPORT_ID_PREFIX.len()..].bytes().enumerate() {
                seen[position].insert(b);
            }
        }
        for (position, chars) in seen.iter().enumerate() {
            assert_eq!(
                chars.len(),
                REPORT_ID_ALPHABET.len(),
                "position {position} only produced {chars:?}"
            );
        }
    }

    #[test]
    fn report_id_parse_rejects_malformed() {
        assert!(ReportId::parse("ID-abcdefgh").is_err());
        assert!(ReportId::parse("ID-ABC").is_err());
        assert!(ReportId::parse("XX-ABCDEFGH").is_err());
        assert!(ReportId::parse("ID-ABCD1234").is_ok());
    }

    #[test]
    fn sentinel_results_are_not_selectable() {
        assert!(!SearchResult::sentinel("No results").is_selectable());
        assert!(SearchResult::new("Accra", 5.6037, -0.1870).is_selectable());
        assert!(SearchResult::new("Equator", 0.0, -0.1870).is_selectable());
    }

    #[test]
    fn report_status_defaults_to_pending() {
        assert_eq!(ReportStatus::default(), ReportStatus::Pending);
        assert_eq!(
            "under-review".parse::<ReportStatus>().unwrap(),
            ReportStatus::UnderReview
        );
    }
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Mining license directory types.
//!
//! A license grants a company the right to mine a concession. The directory
//! lets reporters check whether activity they see is covered by a valid
//! license before filing a report.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Scale class of a mining license.
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
pub enum LicenseScale {
    /// Industrial concession
    #[serde(rename = "Large Scale")]
    #[strum(serialize = "Large Scale")]
    Large,
    /// Mid-size operator
    #[serde(rename = "Medium Scale")]
    #[strum(serialize = "Medium Scale")]
    Medium,
    /// Small-scale or cooperative operator
    #[serde(rename = "Small Scale")]
    #[strum(serialize = "Small Scale")]
    Small,
}

/// Standing of a license.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LicenseStatus {
    /// Valid and in force
    Active,
    /// Application under review
    Pending,
    /// Withdrawn by the regulator
    Revoked,
    /// Lapsed without renewal
    Expired,
}

impl LicenseStatus {
    /// Whether mining under this license is currently permitted.
    #[must_use]
    pub const fn permits_mining(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Point of contact for a license holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseContact {
    /// Contact name.
    pub name: String,
    /// Role at the company.
    pub position: String,
    /// Email address.
    pub email: String,
    /// Phone number.
    pub phone: String,
}

/// A mining license entry in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningLicense {
    /// Regulator-issued license number (e.g. `ML-2025-0485`).
    pub license_id: String,
    /// Scale class.
    pub license_type: LicenseScale,
    /// Holder name.
    pub company_name: String,
    /// Legal form of the holder.
    pub company_type: String,
    /// Administrative region.
    pub region: String,
    /// District within the region.
    pub district: String,
    /// Current standing.
    pub status: LicenseStatus,
    /// Concession name or description.
    pub area_description: String,
    /// Concession latitude.
    pub latitude: f64,
    /// Concession longitude.
    pub longitude: f64,
    /// Concession size (e.g. `500 hectares`).
    pub area_size: String,
    /// Point of contact.
    pub contact: LicenseContact,
    /// Storage paths of permit documents.
    #[serde(default)]
    pub document_files: Vec<String>,
}

/// Filter for license directory queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseQuery {
    /// Only licenses with this status.
    pub status: Option<LicenseStatus>,
    /// Only licenses in this region (case-insensitive).
    pub region: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_round_trips_display_names() {
        assert_eq!(LicenseScale::Large.to_string(), "Large Scale");
        assert_eq!("Small Scale".parse::<LicenseScale>().unwrap(), LicenseScale::Small);
    }

    #[test]
    fn only_active_licenses_permit_mining() {
        assert!(LicenseStatus::Active.permits_mining());
        assert!(!LicenseStatus::Pending.permits_mining());
        assert!(!LicenseStatus::Revoked.permits_mining());
        assert!(!LicenseStatus::Expired.permits_mining());
    }
}

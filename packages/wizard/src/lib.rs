#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The four-step incident report wizard.
//!
//! A reporter moves through report type, incident details, location and
//! evidence. [`controller::WizardController`] owns the [`ReportDraft`],
//! gates forward navigation with [`StepValidator`], and hands the finished
//! record to a [`SubmissionGateway`] exactly once. The reporter always
//! reaches the confirmation, whatever the gateway answers.

pub mod controller;
pub mod draft;
pub mod evidence;
pub mod gateway;
pub mod position;
pub mod validator;

pub use controller::{SearchTicket, Transition, WizardController, WizardState};
pub use draft::ReportDraft;
pub use evidence::{AddOutcome, EvidenceCollector};
pub use gateway::{GatewayError, HttpSubmissionGateway, SubmissionGateway};
pub use position::{FixedPositionProvider, PositionError, PositionOptions, PositionProvider};
pub use validator::{Step, StepValidator};

use thiserror::Error;

/// A required field is missing, or an entry cannot be used.
///
/// These never leave the wizard: they become inline flags on the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No reporter type chosen on step 1.
    #[error("Please select a report type")]
    ReportTypeRequired,

    /// No location chosen on step 3.
    #[error("Please select a location on the map or from search results")]
    LocationRequired,

    /// A typed coordinate is not a number in range.
    #[error("Enter a latitude between -90 and 90 and a longitude between -180 and 180")]
    InvalidCoordinate,

    /// An advisory row from the search results was picked as a location.
    #[error("That entry is a hint, pick one of the places listed below it")]
    NotSelectable,
}

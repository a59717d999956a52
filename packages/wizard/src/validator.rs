//! Per-step forward navigation rules.
//!
//! Rules are evaluated only when the reporter presses Next, never on every
//! edit. Going back is never validated.

use crate::ValidationError;
use crate::draft::ReportDraft;

/// A wizard step, numbered 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    /// Step 1: who is reporting
    ReportType = 1,
    /// Step 2: threat level, activity type and description
    IncidentDetails = 2,
    /// Step 3: where it happened
    Location = 3,
    /// Step 4: evidence and privacy choices
    Evidence = 4,
}

impl Step {
    /// The first step of the wizard.
    pub const FIRST: Self = Self::ReportType;

    /// The step number (1-4).
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Looks up a step by number.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::ReportType),
            2 => Some(Self::IncidentDetails),
            3 => Some(Self::Location),
            4 => Some(Self::Evidence),
            _ => None,
        }
    }

    /// The following step, `None` after the last.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// The preceding step, `None` before the first.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    /// Heading shown for the step.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ReportType => "Report Type",
            Self::IncidentDetails => "Incident Details",
            Self::Location => "Location Information",
            Self::Evidence => "Evidence Upload",
        }
    }
}

/// Gates forward navigation on required fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepValidator;

impl StepValidator {
    /// Checks whether the reporter may leave `step` going forward.
    ///
    /// Leaving [`Step::Evidence`] means submitting.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] naming the missing field.
    pub const fn check(step: Step, draft: &ReportDraft) -> Result<(), ValidationError> {
        match step {
            Step::ReportType if draft.report_type.is_none() => {
                Err(ValidationError::ReportTypeRequired)
            }
            Step::Location if draft.location.is_none() => Err(ValidationError::LocationRequired),
            Step::ReportType | Step::IncidentDetails | Step::Location | Step::Evidence => Ok(()),
        }
    }

    /// Whether the reporter may leave `step` going forward.
    #[must_use]
    pub const fn can_advance(step: Step, draft: &ReportDraft) -> bool {
        Self::check(step, draft).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use galamsey_watch_report_models::{Coordinates, ReportType};

    use super::*;

    #[test]
    fn step_one_requires_report_type() {
        let mut draft = ReportDraft::new();
        assert!(!StepValidator::can_advance(Step::ReportType, &draft));
        assert_eq!(
            StepValidator::check(Step::ReportType, &draft),
            Err(ValidationError::ReportTypeRequired)
        );
        for report_type in ReportType::all() {
            draft.report_type = Some(*report_type);
            assert!(StepValidator::can_advance(Step::ReportType, &draft));
        }
    }

    #[test]
    fn step_two_and_four_always_pass() {
        let draft = ReportDraft::new();
        assert!(StepValidator::can_advance(Step::IncidentDetails, &draft));
        assert!(StepValidator::can_advance(Step::Evidence, &draft));
    }

    #[test]
    fn step_three_requires_location() {
        let mut draft = ReportDraft::new();
        assert_eq!(
            StepValidator::check(Step::Location, &draft),
            Err(ValidationError::LocationRequired)
        );
        draft.location = Some(Coordinates::new(6.2066, -1.6689));
        assert!(StepValidator::can_advance(Step::Location, &draft));
    }

    #[test]
    fn steps_are_numbered_one_to_four() {
        assert_eq!(Step::FIRST.number(), 1);
        assert_eq!(Step::Evidence.next(), None);
        assert_eq!(Step::ReportType.previous(), None);
        assert_eq!(Step::IncidentDetails.next(), Some(Step::Location));
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(5), None);
    }
}

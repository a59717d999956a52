//! Wizard state machine.
//!
//! `Editing(1) → … → Editing(4) → Submitted`. `Submitted` is left only by
//! [`WizardController::reset`].

use std::sync::Arc;

use galamsey_watch_geocoder::LocationResolver;
use galamsey_watch_report_models::{
    Coordinates, EvidenceFile, MiningActivityType, ReportId, ReportType, SearchResult, ThreatLevel,
};

use crate::ValidationError;
use crate::draft::ReportDraft;
use crate::evidence::AddOutcome;
use crate::gateway::SubmissionGateway;
use crate::position::{PositionOptions, PositionProvider, query_position};
use crate::validator::{Step, StepValidator};

/// Minimum trimmed query length before suggestions are fetched while typing.
pub const AUTO_SUGGEST_MIN_CHARS: usize = 3;

/// Shown when no position provider is available.
pub const GEOLOCATION_UNSUPPORTED: &str = "Geolocation is not supported on this device";

/// Shown when the position query fails or times out.
pub const GEOLOCATION_FAILED: &str = "Unable to retrieve your location";

/// Where the reporter is in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    /// Filling in a step.
    Editing(Step),
    /// The confirmation screen.
    Submitted,
}

/// Result of a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Moved to the given step.
    Advanced(Step),
    /// Stayed put because a required field is missing.
    Blocked(ValidationError),
    /// The report was handed to the gateway.
    Submitted(ReportId),
    /// Nothing to do.
    Unchanged,
}

/// Identifies one location search. Only results for the most recently
/// issued ticket are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchTicket(u64);

#[derive(Debug, Default)]
struct SearchState {
    query: String,
    results: Vec<SearchResult>,
    latest: u64,
    show_results: bool,
}

/// Drives a single reporter through the wizard.
pub struct WizardController {
    state: WizardState,
    draft: ReportDraft,
    gateway: Arc<dyn SubmissionGateway>,
    user_agent: String,
    report_type_error: bool,
    location_error: bool,
    location_message: Option<String>,
    locating: bool,
    search: SearchState,
    last_persisted: Option<bool>,
}

impl std::fmt::Debug for WizardController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardController")
            .field("state", &self.state)
            .field("draft", &self.draft)
            .field("report_type_error", &self.report_type_error)
            .field("location_error", &self.location_error)
            .finish_non_exhaustive()
    }
}

impl WizardController {
    /// Starts a fresh wizard on step 1.
    ///
    /// `user_agent` identifies the client and is stored with every report.
    #[must_use]
    pub fn new(gateway: Arc<dyn SubmissionGateway>, user_agent: impl Into<String>) -> Self {
        Self {
            state: WizardState::Editing(Step::FIRST),
            draft: ReportDraft::new(),
            gateway,
            user_agent: user_agent.into(),
            report_type_error: false,
            location_error: false,
            location_message: None,
            locating: false,
            search: SearchState::default(),
            last_persisted: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> WizardState {
        self.state
    }

    #[must_use]
    pub const fn draft(&self) -> &ReportDraft {
        &self.draft
    }

    /// Completion shown in the progress bar: `step × 25`, 100 once submitted.
    #[must_use]
    pub const fn progress_percent(&self) -> u8 {
        match self.state {
            WizardState::Editing(step) => step.number() * 25,
            WizardState::Submitted => 100,
        }
    }

    /// Whether step 1 is showing its "selection required" flag.
    #[must_use]
    pub const fn report_type_error(&self) -> bool {
        self.report_type_error
    }

    /// Whether step 3 is showing its "location required" flag.
    #[must_use]
    pub const fn location_selection_error(&self) -> bool {
        self.location_error
    }

    /// Message from the last failed device position request.
    #[must_use]
    pub fn location_message(&self) -> Option<&str> {
        self.location_message.as_deref()
    }

    /// Whether a device position request is in flight.
    #[must_use]
    pub const fn is_locating(&self) -> bool {
        self.locating
    }

    /// Whether the gateway confirmed the last submission was stored.
    ///
    /// `None` until a submission has been attempted. The reporter sees the
    /// same confirmation either way.
    #[must_use]
    pub const fn last_submission_persisted(&self) -> Option<bool> {
        self.last_persisted
    }

    // Step 1

    pub fn select_report_type(&mut self, report_type: ReportType) {
        self.draft.report_type = Some(report_type);
        self.report_type_error = false;
    }

    // Step 2

    pub const fn set_threat_level(&mut self, threat_level: ThreatLevel) {
        self.draft.threat_level = threat_level;
    }

    pub const fn set_mining_activity_type(&mut self, activity: Option<MiningActivityType>) {
        self.draft.mining_activity_type = activity;
    }

    pub fn set_incident_description(&mut self, text: &str) {
        self.draft.set_incident_description(text);
    }

    // Step 3

    /// Updates the search box, which also becomes the location label until
    /// a result is picked.
    ///
    /// Returns `true` when the query is long enough that suggestions should
    /// be fetched.
    pub fn set_search_query(&mut self, query: &str) -> bool {
        query.clone_into(&mut self.search.query);
        query.clone_into(&mut self.draft.location_label);
        query.trim().chars().count() >= AUTO_SUGGEST_MIN_CHARS
    }

    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search.query
    }

    /// Results currently shown under the search box, empty when hidden.
    #[must_use]
    pub fn search_results(&self) -> &[SearchResult] {
        if self.search.show_results {
            &self.search.results
        } else {
            &[]
        }
    }

    /// Issues a ticket for a new search, superseding every earlier one.
    pub const fn begin_search(&mut self) -> SearchTicket {
        self.search.latest += 1;
        SearchTicket(self.search.latest)
    }

    /// Shows `results` if `ticket` is the latest issued.
    ///
    /// Returns `false` and discards the results if a newer search has begun.
    pub fn apply_search_results(
        &mut self,
        ticket: SearchTicket,
        results: Vec<SearchResult>,
    ) -> bool {
        if ticket.0 != self.search.latest {
            log::debug!(
                "Discarding stale search results (ticket {}, latest {})",
                ticket.0,
                self.search.latest
            );
            return false;
        }
        self.search.show_results = !results.is_empty();
        self.search.results = results;
        true
    }

    /// Resolves the current query and shows the results.
    pub async fn search(&mut self, resolver: &LocationResolver) {
        let ticket = self.begin_search();
        let results = resolver.resolve(&self.search.query).await;
        self.apply_search_results(ticket, results);
    }

    /// Applies a search result as the incident location.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotSelectable`] for advisory rows.
    pub fn select_search_result(&mut self, result: &SearchResult) -> Result<(), ValidationError> {
        if !result.is_selectable() {
            return Err(ValidationError::NotSelectable);
        }
        self.set_location(result.coordinates());
        self.draft.location_label.clone_from(&result.label);
        self.search.show_results = false;
        Ok(())
    }

    /// Sets the location from a point chosen on the map.
    pub fn pick_on_map(&mut self, coordinates: Coordinates) {
        self.set_location(coordinates);
    }

    /// Sets the latitude from a manually typed value. The longitude is
    /// kept, or `0` if no location was set.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCoordinate`] and leaves the location
    /// untouched if `text` is not a latitude in `[-90, 90]`.
    pub fn enter_latitude(&mut self, text: &str) -> Result<(), ValidationError> {
        let lat = parse_coordinate(text, 90.0)?;
        let lng = self.draft.location.map_or(0.0, |c| c.lng);
        self.set_location(Coordinates::new(lat, lng));
        Ok(())
    }

    /// Sets the longitude from a manually typed value. See
    /// [`Self::enter_latitude`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidCoordinate`] if `text` is not a
    /// longitude in `[-180, 180]`.
    pub fn enter_longitude(&mut self, text: &str) -> Result<(), ValidationError> {
        let lng = parse_coordinate(text, 180.0)?;
        let lat = self.draft.location.map_or(0.0, |c| c.lat);
        self.set_location(Coordinates::new(lat, lng));
        Ok(())
    }

    pub fn set_location_label(&mut self, label: &str) {
        label.clone_into(&mut self.draft.location_label);
    }

    /// Queries the device once and applies the fix as the location.
    ///
    /// On failure the location is left untouched and
    /// [`Self::location_message`] explains why.
    pub async fn use_current_position(
        &mut self,
        provider: Option<&dyn PositionProvider>,
    ) -> Option<Coordinates> {
        let Some(provider) = provider else {
            self.location_message = Some(GEOLOCATION_UNSUPPORTED.to_string());
            return None;
        };

        self.locating = true;
        let result = query_position(provider, &PositionOptions::default()).await;
        self.locating = false;

        match result {
            Ok(coordinates) => {
                self.set_location(coordinates);
                Some(coordinates)
            }
            Err(e) => {
                log::warn!("Device position unavailable: {e}");
                self.location_message = Some(GEOLOCATION_FAILED.to_string());
                None
            }
        }
    }

    fn set_location(&mut self, coordinates: Coordinates) {
        self.draft.location = Some(coordinates);
        self.location_error = false;
        self.location_message = None;
    }

    // Step 4

    /// Attaches evidence files, see [`crate::evidence::EvidenceCollector::add`].
    pub fn add_evidence(&mut self, files: impl IntoIterator<Item = EvidenceFile>) -> AddOutcome {
        self.draft.evidence.add(files)
    }

    pub fn remove_evidence(&mut self, index: usize) -> Option<EvidenceFile> {
        self.draft.evidence.remove(index)
    }

    pub const fn set_blur_faces(&mut self, blur: bool) {
        self.draft.evidence.set_blur_faces(blur);
    }

    pub const fn set_strip_location_metadata(&mut self, strip: bool) {
        self.draft.evidence.set_strip_location_metadata(strip);
    }

    // Navigation

    /// Advances one step, or submits from step 4.
    ///
    /// A missing required field keeps the current step and raises its flag.
    pub async fn next(&mut self) -> Transition {
        let WizardState::Editing(step) = self.state else {
            return Transition::Unchanged;
        };

        if let Err(e) = StepValidator::check(step, &self.draft) {
            self.raise(e);
            return Transition::Blocked(e);
        }

        match step.next() {
            Some(next) => {
                self.state = WizardState::Editing(next);
                Transition::Advanced(next)
            }
            None => self.submit().await,
        }
    }

    /// Goes back one step. Never validated, no-op on step 1.
    pub fn back(&mut self) -> Transition {
        match self.state {
            WizardState::Editing(step) => step.previous().map_or(Transition::Unchanged, |prev| {
                self.state = WizardState::Editing(prev);
                Transition::Advanced(prev)
            }),
            WizardState::Submitted => Transition::Unchanged,
        }
    }

    /// Discards everything and returns to step 1 with a fresh draft.
    pub fn reset(&mut self) {
        self.state = WizardState::Editing(Step::FIRST);
        self.draft = ReportDraft::new();
        self.report_type_error = false;
        self.location_error = false;
        self.location_message = None;
        self.locating = false;
        self.search = SearchState {
            latest: self.search.latest,
            ..SearchState::default()
        };
        self.last_persisted = None;
    }

    async fn submit(&mut self) -> Transition {
        let report_id = ReportId::generate();
        self.draft.report_id = Some(report_id.clone());

        let record = match self.draft.to_record(report_id.clone(), &self.user_agent) {
            Ok(record) => record,
            Err(e) => {
                self.state = WizardState::Editing(Step::FIRST);
                self.raise(e);
                return Transition::Blocked(e);
            }
        };

        let persisted = match self.gateway.store(&record).await {
            Ok(outcome) if outcome.success => {
                log::info!("Report {report_id} stored");
                true
            }
            Ok(outcome) => {
                log::error!(
                    "Report {report_id} was not stored: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
                false
            }
            Err(e) => {
                log::error!("Report {report_id} was not stored: {e}");
                false
            }
        };

        self.last_persisted = Some(persisted);
        self.state = WizardState::Submitted;
        Transition::Submitted(report_id)
    }

    const fn raise(&mut self, error: ValidationError) {
        match error {
            ValidationError::ReportTypeRequired => self.report_type_error = true,
            ValidationError::LocationRequired => self.location_error = true,
            ValidationError::NotSelectable | ValidationError::InvalidCoordinate => {}
        }
    }
}

fn parse_coordinate(text: &str, bound: f64) -> Result<f64, ValidationError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= bound)
        .ok_or(ValidationError::InvalidCoordinate)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use galamsey_watch_geocoder::{AddressSearch, GeocodeError};
    use galamsey_watch_report_models::{ReportRecord, StoreOutcome};

    use super::*;
    use crate::gateway::GatewayError;
    use crate::position::{FixedPositionProvider, PositionError};

    #[derive(Default)]
    struct RecordingGateway {
        records: Mutex<Vec<ReportRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl SubmissionGateway for RecordingGateway {
        async fn store(&self, record: &ReportRecord) -> Result<StoreOutcome, GatewayError> {
            self.records.lock().unwrap().push(record.clone());
            if self.fail {
                Ok(StoreOutcome::failed("disk full"))
            } else {
                Ok(StoreOutcome::stored())
            }
        }
    }

    struct CitySearch;

    #[async_trait]
    impl AddressSearch for CitySearch {
        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GeocodeError> {
            if query.starts_with("Accra") {
                Ok(vec![SearchResult::new("Accra", 5.6037, -0.1870)])
            } else {
                Ok(Vec::new())
            }
        }
    }

    struct DeniedProvider;

    #[async_trait]
    impl PositionProvider for DeniedProvider {
        async fn current_position(
            &self,
            _options: &PositionOptions,
        ) -> Result<Coordinates, PositionError> {
            Err(PositionError::PermissionDenied)
        }
    }

    fn controller() -> (WizardController, Arc<RecordingGateway>) {
        let gateway = Arc::new(RecordingGateway::default());
        let wizard = WizardController::new(gateway.clone(), "test-agent/1.0");
        (wizard, gateway)
    }

    #[tokio::test]
    async fn citizen_report_from_accra_reaches_confirmation() {
        let (mut wizard, gateway) = controller();
        let resolver = LocationResolver::new(Arc::new(CitySearch));

        wizard.select_report_type(ReportType::Citizen);
        assert_eq!(wizard.next().await, Transition::Advanced(Step::IncidentDetails));
        assert_eq!(wizard.next().await, Transition::Advanced(Step::Location));

        assert!(wizard.set_search_query("Accra"));
        wizard.search(&resolver).await;
        let accra = wizard.search_results()[0].clone();
        wizard.select_search_result(&accra).unwrap();
        assert_eq!(wizard.next().await, Transition::Advanced(Step::Evidence));

        let Transition::Submitted(report_id) = wizard.next().await else {
            panic!("expected submission");
        };
        assert_eq!(wizard.state(), WizardState::Submitted);
        assert_eq!(wizard.last_submission_persisted(), Some(true));

        let records = gateway.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.report_id, report_id);
        assert_eq!(record.report_type, ReportType::Citizen);
        assert_eq!(record.location_lat, Some(5.6037));
        assert_eq!(record.location_lng, Some(-0.1870));
        assert_eq!(record.location_description, "Accra");
        assert!(record.evidence_files.is_empty());
        assert_eq!(record.user_agent, "test-agent/1.0");
    }

    #[tokio::test]
    async fn step_three_without_location_is_blocked() {
        let (mut wizard, _) = controller();
        wizard.select_report_type(ReportType::Official);
        wizard.next().await;
        wizard.next().await;

        assert_eq!(
            wizard.next().await,
            Transition::Blocked(ValidationError::LocationRequired)
        );
        assert_eq!(wizard.state(), WizardState::Editing(Step::Location));
        assert!(wizard.location_selection_error());

        wizard.pick_on_map(Coordinates::new(6.2066, -1.6689));
        assert!(!wizard.location_selection_error());
    }

    #[tokio::test]
    async fn picking_a_search_result_clears_the_location_flag() {
        let (mut wizard, _) = controller();
        let resolver = LocationResolver::new(Arc::new(CitySearch));
        wizard.select_report_type(ReportType::Citizen);
        wizard.next().await;
        wizard.next().await;
        assert_eq!(
            wizard.next().await,
            Transition::Blocked(ValidationError::LocationRequired)
        );
        assert!(wizard.location_selection_error());

        wizard.set_search_query("Accra");
        wizard.search(&resolver).await;
        let accra = wizard.search_results()[0].clone();
        wizard.select_search_result(&accra).unwrap();

        assert!(!wizard.location_selection_error());
        assert_eq!(wizard.draft().location, Some(accra.coordinates()));
        assert_eq!(wizard.next().await, Transition::Advanced(Step::Evidence));
    }

    #[tokio::test]
    async fn step_one_requires_report_type() {
        let (mut wizard, _) = controller();
        assert_eq!(
            wizard.next().await,
            Transition::Blocked(ValidationError::ReportTypeRequired)
        );
        assert!(wizard.report_type_error());
        assert_eq!(wizard.progress_percent(), 25);

        wizard.select_report_type(ReportType::AnonymousTip);
        assert!(!wizard.report_type_error());
        assert_eq!(wizard.next().await, Transition::Advanced(Step::IncidentDetails));
        assert_eq!(wizard.progress_percent(), 50);
    }

    #[tokio::test]
    async fn failed_store_still_confirms() {
        let gateway = Arc::new(RecordingGateway {
            fail: true,
            ..RecordingGateway::default()
        });
        let mut wizard = WizardController::new(gateway.clone(), "test");
        wizard.select_report_type(ReportType::Citizen);
        wizard.next().await;
        wizard.next().await;
        wizard.enter_latitude("5.3");
        wizard.next().await;

        assert!(matches!(wizard.next().await, Transition::Submitted(_)));
        assert_eq!(wizard.state(), WizardState::Submitted);
        assert_eq!(wizard.last_submission_persisted(), Some(false));
        assert_eq!(wizard.next().await, Transition::Unchanged);
        assert_eq!(gateway.records.lock().unwrap().len(), 1);

        wizard.reset();
        assert_eq!(wizard.state(), WizardState::Editing(Step::FIRST));
        assert_eq!(wizard.draft(), &ReportDraft::new());
        assert_eq!(wizard.last_submission_persisted(), None);
    }

    #[tokio::test]
    async fn back_is_never_validated() {
        let (mut wizard, _) = controller();
        assert_eq!(wizard.back(), Transition::Unchanged);
        wizard.select_report_type(ReportType::Citizen);
        wizard.next().await;
        wizard.next().await;
        assert_eq!(wizard.back(), Transition::Advanced(Step::IncidentDetails));
        assert_eq!(wizard.back(), Transition::Advanced(Step::ReportType));
    }

    #[test]
    fn stale_search_results_are_dropped() {
        let (mut wizard, _) = controller();
        let slow = wizard.begin_search();
        let fresh = wizard.begin_search();

        let kumasi = vec![SearchResult::new("Kumasi", 6.6885, -1.6244)];
        let accra = vec![SearchResult::new("Accra", 5.6037, -0.1870)];
        assert!(wizard.apply_search_results(fresh, kumasi));
        assert!(!wizard.apply_search_results(slow, accra));
        assert_eq!(wizard.search_results()[0].label, "Kumasi");
    }

    #[tokio::test]
    async fn advisory_rows_cannot_be_selected() {
        let (mut wizard, _) = controller();
        let resolver = LocationResolver::new(Arc::new(CitySearch));
        wizard.set_search_query("Nowhere");
        wizard.search(&resolver).await;

        let header = wizard.search_results()[0].clone();
        assert_eq!(
            wizard.select_search_result(&header),
            Err(ValidationError::NotSelectable)
        );
        assert!(wizard.draft().location.is_none());

        let obuasi = wizard.search_results()[1].clone();
        wizard.select_search_result(&obuasi).unwrap();
        assert_eq!(wizard.draft().location, Some(obuasi.coordinates()));
        assert!(wizard.search_results().is_empty());
    }

    #[test]
    fn auto_suggest_needs_three_characters() {
        let (mut wizard, _) = controller();
        assert!(!wizard.set_search_query("  Ac "));
        assert!(wizard.set_search_query("Acc"));
        assert_eq!(wizard.draft().location_label, "Acc");
    }

    #[test]
    fn manual_entry_keeps_other_coordinate() {
        let (mut wizard, _) = controller();
        wizard.enter_longitude("-1.75").unwrap();
        assert_eq!(wizard.draft().location, Some(Coordinates::new(0.0, -1.75)));
        wizard.enter_latitude(" 4.88 ").unwrap();
        assert_eq!(wizard.draft().location, Some(Coordinates::new(4.88, -1.75)));
    }

    #[tokio::test]
    async fn unparseable_coordinates_are_rejected() {
        let (mut wizard, _) = controller();
        wizard.select_report_type(ReportType::Citizen);
        wizard.next().await;
        wizard.next().await;

        assert_eq!(
            wizard.enter_latitude("north"),
            Err(ValidationError::InvalidCoordinate)
        );
        assert_eq!(
            wizard.enter_longitude("west"),
            Err(ValidationError::InvalidCoordinate)
        );
        assert_eq!(
            wizard.enter_latitude("91"),
            Err(ValidationError::InvalidCoordinate)
        );
        assert!(wizard.draft().location.is_none());
        assert_eq!(
            wizard.next().await,
            Transition::Blocked(ValidationError::LocationRequired)
        );

        wizard.enter_latitude("4.88").unwrap();
        assert_eq!(
            wizard.enter_longitude("NaN"),
            Err(ValidationError::InvalidCoordinate)
        );
        assert_eq!(wizard.draft().location, Some(Coordinates::new(4.88, 0.0)));
    }

    #[tokio::test]
    async fn device_position_messages() {
        let (mut wizard, _) = controller();

        assert_eq!(wizard.use_current_position(None).await, None);
        assert_eq!(wizard.location_message(), Some(GEOLOCATION_UNSUPPORTED));

        assert_eq!(wizard.use_current_position(Some(&DeniedProvider)).await, None);
        assert_eq!(wizard.location_message(), Some(GEOLOCATION_FAILED));
        assert!(!wizard.is_locating());

        let fix = FixedPositionProvider(Coordinates::new(5.4323, -2.1437));
        assert_eq!(wizard.use_current_position(Some(&fix)).await, Some(fix.0));
        assert_eq!(wizard.location_message(), None);
        assert_eq!(wizard.draft().location, Some(fix.0));
    }
}

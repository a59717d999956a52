#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Location search for the report wizard.
//!
//! Resolves a free-text place name to candidate coordinates using the
//! provider configured in [`service_registry`] (Nominatim restricted to
//! Ghana). A search always yields something the reporter can pick:
//!
//! 1. Blank query → no results, no network call.
//! 2. Provider matches → returned in provider order.
//! 3. Provider returns nothing → advisory row plus known mining areas.
//! 4. Provider fails → advisory row plus major cities.
//!
//! There is no retry. See [`fallback`] for the substitute lists.

pub mod fallback;
pub mod nominatim;
pub mod service_registry;

use std::sync::Arc;

use async_trait::async_trait;
use galamsey_watch_report_models::SearchResult;
use thiserror::Error;

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Geocoding service returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Embedded service configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

/// A free-text address search backend.
#[async_trait]
pub trait AddressSearch: Send + Sync {
    /// Searches for places matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request or response parsing fails.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GeocodeError>;
}

/// Resolves place names to coordinates with deterministic fallbacks.
#[derive(Clone)]
pub struct LocationResolver {
    backend: Arc<dyn AddressSearch>,
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver").finish_non_exhaustive()
    }
}

impl LocationResolver {
    /// Creates a resolver over the given search backend.
    #[must_use]
    pub fn new(backend: Arc<dyn AddressSearch>) -> Self {
        Self { backend }
    }

    /// Creates a resolver using the preferred registry service, honouring a
    /// `NOMINATIM_URL` override from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the service configuration is invalid or
    /// the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, GeocodeError> {
        let service = service_registry::preferred_service()?;
        let override_url = std::env::var("NOMINATIM_URL")
            .ok()
            .filter(|u| !u.trim().is_empty());
        if let Some(url) = &override_url {
            log::info!("Using geocoding endpoint override {url}");
        }
        let client = nominatim::NominatimClient::from_service(&service, override_url)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Resolves `query` into selectable places.
    ///
    /// Never fails: provider errors are logged and replaced by
    /// [`fallback::search_failed`], and empty matches by
    /// [`fallback::no_results`]. The first element of a fallback list sits
    /// at `(0, 0)` and is not selectable.
    pub async fn resolve(&self, query: &str) -> Vec<SearchResult> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        match self.backend.search(trimmed).await {
            Ok(results) if results.is_empty() => {
                log::debug!("No geocoding match for {trimmed:?}");
                fallback::no_results(query)
            }
            Ok(results) => results,
            Err(e) => {
                log::warn!("Location search failed for {trimmed:?}: {e}");
                fallback::search_failed()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct FakeSearch {
        calls: AtomicUsize,
        response: fn() -> Result<Vec<SearchResult>, GeocodeError>,
    }

    impl FakeSearch {
        fn new(response: fn() -> Result<Vec<SearchResult>, GeocodeError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response,
            })
        }
    }

    #[async_trait]
    impl AddressSearch for FakeSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.response)()
        }
    }

    #[tokio::test]
    async fn blank_query_skips_network() {
        let fake = FakeSearch::new(|| Ok(vec![SearchResult::new("Accra", 5.6, -0.18)]));
        let resolver = LocationResolver::new(fake.clone());
        assert!(resolver.resolve("").await.is_empty());
        assert!(resolver.resolve("   \t").await.is_empty());
        assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_matches_pass_through_in_order() {
        let fake = FakeSearch::new(|| {
            Ok(vec![
                SearchResult::new("Kumasi, Ashanti", 6.6885, -1.6244),
                SearchResult::new("Kumasi Airport", 6.7146, -1.5909),
            ])
        });
        let resolver = LocationResolver::new(fake);
        let results = resolver.resolve("Kumasi").await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].label, "Kumasi, Ashanti");
        assert!(results.iter().all(SearchResult::is_selectable));
    }

    #[tokio::test]
    async fn empty_match_falls_back_to_mining_areas() {
        let resolver = LocationResolver::new(FakeSearch::new(|| Ok(Vec::new())));
        let results = resolver.resolve("Nowhere").await;
        assert!(!results[0].is_selectable());
        assert!(results[0].label.contains("Nowhere"));
        assert_eq!(results.len(), fallback::MINING_AREAS.len() + 1);
    }

    #[tokio::test]
    async fn failure_falls_back_to_major_cities() {
        let resolver = LocationResolver::new(FakeSearch::new(|| Err(GeocodeError::RateLimited)));
        let first = resolver.resolve("Tarkwa").await;
        let second = resolver.resolve("something else").await;
        assert_eq!(first, second);
        assert!(!first[0].is_selectable());
        assert_eq!(first[1].label, "Accra");
    }
}

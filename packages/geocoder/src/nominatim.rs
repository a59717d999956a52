//! Nominatim / OpenStreetMap free-text search client.
//!
//! The public instance allows at most **1 request per second** and requires
//! an identifying `User-Agent`. Searches are restricted to a single country
//! via `countrycodes`, and a country qualifier is appended to the query to
//! bias ranking toward places in that country.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Duration;

use async_trait::async_trait;
use galamsey_watch_report_models::SearchResult;

use crate::service_registry::{GeocodingService, ProviderConfig};
use crate::{AddressSearch, GeocodeError};

/// A configured Nominatim search client.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    country_code: String,
    country_qualifier: String,
    result_limit: u32,
}

impl NominatimClient {
    /// Builds a client from a registry service definition.
    ///
    /// `base_url_override` replaces the configured endpoint (e.g. for a
    /// self-hosted instance).
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn from_service(
        service: &GeocodingService,
        base_url_override: Option<String>,
    ) -> Result<Self, GeocodeError> {
        let ProviderConfig::Nominatim {
            base_url,
            country_code,
            country_qualifier,
            result_limit,
            timeout_secs,
            user_agent,
        } = &service.provider;

        let client = reqwest::Client::builder()
            .user_agent(user_agent.as_str())
            .timeout(Duration::from_secs(*timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url_override.unwrap_or_else(|| base_url.clone()),
            country_code: country_code.clone(),
            country_qualifier: country_qualifier.clone(),
            result_limit: *result_limit,
        })
    }

    /// The search endpoint this client calls.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds the `q` parameter: the trimmed query with the country
    /// qualifier appended.
    #[must_use]
    pub fn qualified_query(&self, query: &str) -> String {
        format!("{}, {}", query.trim(), self.country_qualifier)
    }
}

#[async_trait]
impl AddressSearch for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, GeocodeError> {
        let q = self.qualified_query(query);
        let limit = self.result_limit.to_string();

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("format", "json"),
                ("q", q.as_str()),
                ("countrycodes", self.country_code.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }
        if !resp.status().is_success() {
            return Err(GeocodeError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_response(&body)
    }
}

/// Parses a Nominatim JSON response, preserving provider order.
///
/// `lat` and `lon` are string-encoded floats. A record with a missing or
/// unparsable coordinate fails the whole response.
///
/// # Errors
///
/// Returns [`GeocodeError::Parse`] if the body is not an array or a record
/// lacks valid coordinates.
pub fn parse_response(body: &serde_json::Value) -> Result<Vec<SearchResult>, GeocodeError> {
    let records = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    records
        .iter()
        .map(|record| {
            let lat = parse_coordinate(record, "lat")?;
            let lng = parse_coordinate(record, "lon")?;
            let label = record["display_name"].as_str().unwrap_or_default();
            Ok(SearchResult::new(label, lat, lng))
        })
        .collect()
}

fn parse_coordinate(record: &serde_json::Value, key: &str) -> Result<f64, GeocodeError> {
    record[key]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: format!("Missing {key} in Nominatim response"),
        })
}

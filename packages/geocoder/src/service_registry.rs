//! Compile-time registry of geocoding service configurations.
//!
//! Each provider is defined in a TOML file under `services/`. The registry
//! embeds these at compile time and exposes them via [`all_services`] and
//! [`enabled_services`].

use serde::Deserialize;

use crate::GeocodeError;

/// A geocoding service configuration loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingService {
    /// Unique identifier (e.g., `"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Whether this service may be used for location search.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Selection order, lower values are preferred.
    pub priority: u32,
    /// Provider-specific configuration.
    pub provider: ProviderConfig,
}

/// Provider-specific configuration, tagged by `type` in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Nominatim / `OpenStreetMap` free-text search.
    Nominatim {
        /// Search endpoint (e.g., `"https://nominatim.openstreetmap.org/search"`).
        base_url: String,
        /// ISO country code results are restricted to.
        country_code: String,
        /// Appended to every query (e.g., `"Ghana"`).
        country_qualifier: String,
        /// Maximum number of matches requested.
        #[serde(default = "default_result_limit")]
        result_limit: u32,
        /// Request timeout in seconds.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        /// `User-Agent` sent with every request. The public Nominatim
        /// instance rejects anonymous clients.
        user_agent: String,
    },
}

const fn default_true() -> bool {
    true
}

const fn default_result_limit() -> u32 {
    5
}

const fn default_timeout_secs() -> u64 {
    10
}

impl GeocodingService {
    /// Returns the provider's base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        match &self.provider {
            ProviderConfig::Nominatim { base_url, .. } => base_url,
        }
    }
}

// ── Compile-time embedded TOML files ────────────────────────────────

const SERVICE_TOMLS: &[(&str, &str)] =
    &[("nominatim", include_str!("../services/nominatim.toml"))];

#[cfg(test)]
const EXPECTED_SERVICE_COUNT: usize = 1;

/// Returns all geocoding service configurations (enabled and disabled).
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if an embedded TOML file is malformed.
pub fn all_services() -> Result<Vec<GeocodingService>, GeocodeError> {
    SERVICE_TOMLS
        .iter()
        .map(|(name, toml_str)| {
            toml::de::from_str(toml_str).map_err(|e| GeocodeError::Config {
                message: format!("Failed to parse geocoding service '{name}': {e}"),
            })
        })
        .collect()
}

/// Returns only enabled services, sorted by priority (ascending).
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if an embedded TOML file is malformed.
pub fn enabled_services() -> Result<Vec<GeocodingService>, GeocodeError> {
    let mut services: Vec<GeocodingService> =
        all_services()?.into_iter().filter(|s| s.enabled).collect();
    services.sort_by_key(|s| s.priority);
    Ok(services)
}

/// Returns the highest-priority enabled service.
///
/// # Errors
///
/// Returns [`GeocodeError::Config`] if no service is enabled or a TOML file
/// is malformed.
pub fn preferred_service() -> Result<GeocodingService, GeocodeError> {
    enabled_services()?
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::Config {
            message: "No geocoding service is enabled".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_services() {
        let services = all_services().unwrap();
        assert_eq!(services.len(), EXPECTED_SERVICE_COUNT);
    }

    #[test]
    fn service_ids_are_unique() {
        let services = all_services().unwrap();
        let mut seen = BTreeSet::new();
        for svc in &services {
            assert!(seen.insert(&svc.id), "Duplicate service ID: {}", svc.id);
        }
    }

    #[test]
    fn all_services_have_required_fields() {
        for svc in &all_services().unwrap() {
            assert!(!svc.id.is_empty(), "Service has empty id");
            assert!(!svc.name.is_empty(), "Service {} has empty name", svc.id);
            assert!(
                !svc.base_url().is_empty(),
                "Service {} has empty base_url",
                svc.id
            );
        }
    }

    #[test]
    fn nominatim_is_restricted_to_ghana() {
        let svc = preferred_service().unwrap();
        let ProviderConfig::Nominatim {
            country_code,
            country_qualifier,
            result_limit,
            ..
        } = svc.provider;
        assert_eq!(country_code, "gh");
        assert_eq!(country_qualifier, "Ghana");
        assert_eq!(result_limit, 5);
    }
}

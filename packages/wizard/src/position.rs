//! Single-shot device position queries.
//!
//! The wizard asks a [`PositionProvider`] once per "use my current
//! location" request and never accepts a cached fix. The timeout is
//! enforced here rather than trusted to the provider.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use galamsey_watch_report_models::Coordinates;
use thiserror::Error;

/// Options passed with every position query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Request the most accurate fix available.
    pub high_accuracy: bool,
    /// Give up after this long.
    pub timeout: Duration,
    /// Oldest cached fix that may be returned.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(5000),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Errors from position queries.
#[derive(Debug, Error)]
pub enum PositionError {
    /// The reporter refused location access.
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix could be obtained.
    #[error("Position unavailable: {0}")]
    Unavailable(String),

    /// No fix within [`PositionOptions::timeout`].
    #[error("Timed out waiting for a position fix")]
    Timeout,
}

/// A source of the device's current position.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Returns the current position.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError`] if no fix can be obtained.
    async fn current_position(&self, options: &PositionOptions)
    -> Result<Coordinates, PositionError>;
}

/// Queries `provider`, failing with [`PositionError::Timeout`] once
/// `options.timeout` elapses.
///
/// # Errors
///
/// Returns the provider's error, or [`PositionError::Timeout`].
pub async fn query_position(
    provider: &dyn PositionProvider,
    options: &PositionOptions,
) -> Result<Coordinates, PositionError> {
    tokio::time::timeout(options.timeout, provider.current_position(options))
        .await
        .map_err(|_| PositionError::Timeout)?
}

/// A provider that always reports the same position, e.g. a fix read from
/// an external GPS receiver and passed on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPositionProvider(pub Coordinates);

#[async_trait]
impl PositionProvider for FixedPositionProvider {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, PositionError> {
        Ok(self.0)
    }
}

impl FromStr for FixedPositionProvider {
    type Err = PositionError;

    /// Parses `"lat,lng"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PositionError::Unavailable(format!("expected \"lat,lng\", got {s:?}"));
        let (lat, lng) = s.split_once(',').ok_or_else(invalid)?;
        let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
        let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(invalid());
        }
        Ok(Self(Coordinates::new(lat, lng)))
    }
}

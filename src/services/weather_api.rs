//! Trait and types for a historical weather provider.

use chrono::{DateTime, Utc};

use crate::error::FetchError;
use crate::model::WeatherObservation;

/// A venue to fetch weather for.
///
/// `name` becomes the observation's location key; coordinates are resolved
/// by the provider when not given.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub coordinates: Option<(f64, f64)>,
}

impl Place {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            coordinates: None,
        }
    }
}

/// Abstraction over a weather provider (e.g., OpenWeatherMap).
#[async_trait::async_trait]
pub trait WeatherSource: Send + Sync {
    /// Resolves a place name into `(latitude, longitude)`.
    async fn geocode(&self, name: &str) -> Result<Option<(f64, f64)>, FetchError>;

    /// Returns the hourly observation covering `at`, or `None` if the
    /// provider has no data for that hour.
    async fn observation(
        &self,
        place: &Place,
        at: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>, FetchError>;
}

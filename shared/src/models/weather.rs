//! Weather data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions at a location, as returned by the weather provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherSnapshot {
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    /// Precipitation over the last hour; zero when the provider reports none.
    pub rainfall_mm: f64,
    pub conditions: String,
}

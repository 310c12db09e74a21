//! Weather API client for fetching current conditions
//!
//! Integrates with an OpenWeatherMap-compatible endpoint queried by
//! location string. Requests carry a bounded timeout and any transport or
//! provider failure maps to `WeatherServiceUnavailable`, so an unreachable
//! provider degrades the crop endpoint instead of failing the process.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use shared::WeatherSnapshot;

use crate::error::{AppError, AppResult};

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OwmCurrentResponse {
    weather: Vec<OwmWeather>,
    main: OwmMain,
    rain: Option<OwmRain>,
    dt: i64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

impl WeatherClient {
    /// Create a new WeatherClient with a bounded request timeout
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self::with_base_url(
            api_key,
            "https://api.openweathermap.org/data/2.5".to_string(),
            timeout,
        )
    }

    /// Create a new WeatherClient with custom base URL (for testing)
    pub fn with_base_url(api_key: String, base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            base_url,
        }
    }

    /// Fetch current weather conditions by location string
    pub async fn current_by_location(&self, location: &str) -> AppResult<WeatherSnapshot> {
        let url = format!(
            "{}/weather?q={}&appid={}&units=metric",
            self.base_url, location, self.api_key
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::warn!("Weather API request failed: {e}");
            AppError::WeatherServiceUnavailable
        })?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!("Weather API returned {status} for location {location:?}");
            return Err(AppError::WeatherServiceUnavailable);
        }

        let data: OwmCurrentResponse = response.json().await.map_err(|e| {
            tracing::warn!("Failed to parse weather response: {e}");
            AppError::WeatherServiceUnavailable
        })?;

        Ok(convert_current_response(data))
    }
}

/// Convert the provider response to our snapshot format
fn convert_current_response(data: OwmCurrentResponse) -> WeatherSnapshot {
    let conditions = data
        .weather
        .first()
        .map(|w| {
            if w.description.is_empty() {
                w.main.clone()
            } else {
                w.description.clone()
            }
        })
        .unwrap_or_default();

    let rainfall_mm = data
        .rain
        .as_ref()
        .and_then(|r| r.one_hour.or(r.three_hour))
        .unwrap_or(0.0);

    WeatherSnapshot {
        timestamp: DateTime::from_timestamp(data.dt, 0).unwrap_or_else(Utc::now),
        location: data.name,
        temperature_celsius: data.main.temp,
        humidity_percent: data.main.humidity,
        rainfall_mm,
        conditions,
    }
}

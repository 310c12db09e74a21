//! Validation utilities for sensor readings and request payloads

use serde_json::Value;

use crate::models::SensorReading;
use crate::types::SoilParameter;

/// Wire field names required on every analyze request, in declaration order.
pub const REQUIRED_FIELDS: [&str; 7] = ["N", "P", "K", "CO2", "Temperature", "Moisture", "pH"];

/// Why a payload failed validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadingError {
    #[error("missing required fields: {0:?}")]
    MissingFields(Vec<&'static str>),
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Parse a JSON payload into a reading, reporting every absent field rather
/// than just the first serde hits.
pub fn parse_reading(payload: &Value) -> Result<SensorReading, ReadingError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .filter(|field| payload.get(**field).is_none())
        .copied()
        .collect();

    if !missing.is_empty() {
        return Err(ReadingError::MissingFields(missing));
    }

    let reading: SensorReading =
        serde_json::from_value(payload.clone()).map_err(|e| ReadingError::InvalidValue {
            field: "reading",
            message: format!("invalid data type: {e}"),
        })?;

    validate_reading(&reading)?;
    Ok(reading)
}

/// Plausibility bounds for a measurement. Far wider than any agronomic
/// band; they reject only physically impossible values and non-finite
/// floats, which would otherwise poison downstream arithmetic.
fn plausible_bounds(param: SoilParameter) -> (f64, f64) {
    match param {
        SoilParameter::Nitrogen | SoilParameter::Phosphorus | SoilParameter::Potassium => {
            (0.0, 10_000.0)
        }
        SoilParameter::Co2 => (0.0, 100_000.0),
        SoilParameter::Temperature => (-50.0, 70.0),
        SoilParameter::Moisture => (0.0, 100.0),
        SoilParameter::Ph => (0.0, 14.0),
    }
}

/// Reject non-finite or physically impossible measurements.
pub fn validate_reading(reading: &SensorReading) -> Result<(), ReadingError> {
    for (param, field) in SoilParameter::ALL.into_iter().zip(REQUIRED_FIELDS) {
        let value = reading.value(param);
        if !value.is_finite() {
            return Err(ReadingError::InvalidValue {
                field,
                message: "value must be a finite number".to_string(),
            });
        }
        let (min, max) = plausible_bounds(param);
        if value < min || value > max {
            return Err(ReadingError::InvalidValue {
                field,
                message: format!("value {value} outside plausible bounds {min}..{max}"),
            });
        }
    }
    Ok(())
}

/// Validate a crop-recommendation location string.
pub fn validate_location(location: &str) -> Result<(), &'static str> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err("location must not be empty");
    }
    if trimmed.len() > 100 {
        return Err("location must be at most 100 characters");
    }
    Ok(())
}

//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// The seven soil parameters measured by a sensor node.
///
/// The variant order is the canonical declaration order; critical-factor
/// lists and CSV columns follow it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SoilParameter {
    Nitrogen,
    Phosphorus,
    Potassium,
    Co2,
    Temperature,
    Moisture,
    Ph,
}

impl SoilParameter {
    /// All parameters in declaration order.
    pub const ALL: [SoilParameter; 7] = [
        SoilParameter::Nitrogen,
        SoilParameter::Phosphorus,
        SoilParameter::Potassium,
        SoilParameter::Co2,
        SoilParameter::Temperature,
        SoilParameter::Moisture,
        SoilParameter::Ph,
    ];

    /// Short key used on the wire and in CSV headers.
    pub fn key(&self) -> &'static str {
        match self {
            SoilParameter::Nitrogen => "N",
            SoilParameter::Phosphorus => "P",
            SoilParameter::Potassium => "K",
            SoilParameter::Co2 => "CO2",
            SoilParameter::Temperature => "Temperature",
            SoilParameter::Moisture => "Moisture",
            SoilParameter::Ph => "pH",
        }
    }

    /// Human-readable name reported in critical-factor lists.
    pub fn display_name(&self) -> &'static str {
        match self {
            SoilParameter::Nitrogen => "Nitrogen",
            SoilParameter::Phosphorus => "Phosphorus",
            SoilParameter::Potassium => "Potassium",
            SoilParameter::Co2 => "CO2",
            SoilParameter::Temperature => "Temperature",
            SoilParameter::Moisture => "Moisture",
            SoilParameter::Ph => "pH",
        }
    }

    /// Measurement unit.
    pub fn unit(&self) -> &'static str {
        match self {
            SoilParameter::Nitrogen | SoilParameter::Phosphorus | SoilParameter::Potassium => {
                "mg/kg"
            }
            SoilParameter::Co2 => "ppm",
            SoilParameter::Temperature => "°C",
            SoilParameter::Moisture => "%",
            SoilParameter::Ph => "pH",
        }
    }

    /// Agronomic role of the parameter.
    pub fn description(&self) -> &'static str {
        match self {
            SoilParameter::Nitrogen => "Nitrogen - Essential for plant growth",
            SoilParameter::Phosphorus => "Phosphorus - Important for root development",
            SoilParameter::Potassium => "Potassium - Vital for plant health",
            SoilParameter::Co2 => "Carbon Dioxide - Affects soil respiration",
            SoilParameter::Temperature => "Soil Temperature - Affects microbial activity",
            SoilParameter::Moisture => "Soil Moisture - Critical for nutrient availability",
            SoilParameter::Ph => "pH - Affects nutrient availability",
        }
    }
}

impl std::fmt::Display for SoilParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A closed numeric interval for a soil parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
}

impl ParameterRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

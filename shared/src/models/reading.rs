//! Sensor reading models

use serde::{Deserialize, Serialize};

use crate::types::SoilParameter;

/// One point-in-time measurement from a soil sensor node.
///
/// All seven parameters are required on the wire; the serde renames preserve
/// the field spelling used by the sensor firmware and the CSV mirror.
/// Immutable once captured.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    #[serde(rename = "CO2")]
    pub co2: f64,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Moisture")]
    pub moisture: f64,
    #[serde(rename = "pH")]
    pub ph: f64,
}

impl SensorReading {
    pub fn value(&self, param: SoilParameter) -> f64 {
        match param {
            SoilParameter::Nitrogen => self.nitrogen,
            SoilParameter::Phosphorus => self.phosphorus,
            SoilParameter::Potassium => self.potassium,
            SoilParameter::Co2 => self.co2,
            SoilParameter::Temperature => self.temperature,
            SoilParameter::Moisture => self.moisture,
            SoilParameter::Ph => self.ph,
        }
    }

    /// Copy with every parameter rounded to two decimals, the precision kept
    /// by the CSV mirror.
    pub fn rounded(&self) -> Self {
        let round2 = |v: f64| (v * 100.0).round() / 100.0;
        Self {
            nitrogen: round2(self.nitrogen),
            phosphorus: round2(self.phosphorus),
            potassium: round2(self.potassium),
            co2: round2(self.co2),
            temperature: round2(self.temperature),
            moisture: round2(self.moisture),
            ph: round2(self.ph),
        }
    }
}

/// Scoring-core view of a reading in which any parameter may be absent.
///
/// Absent parameters are excluded from scoring, never treated as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialReading {
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub co2: Option<f64>,
    pub temperature: Option<f64>,
    pub moisture: Option<f64>,
    pub ph: Option<f64>,
}

impl PartialReading {
    pub fn value(&self, param: SoilParameter) -> Option<f64> {
        match param {
            SoilParameter::Nitrogen => self.nitrogen,
            SoilParameter::Phosphorus => self.phosphorus,
            SoilParameter::Potassium => self.potassium,
            SoilParameter::Co2 => self.co2,
            SoilParameter::Temperature => self.temperature,
            SoilParameter::Moisture => self.moisture,
            SoilParameter::Ph => self.ph,
        }
    }

    pub fn set(&mut self, param: SoilParameter, value: f64) {
        match param {
            SoilParameter::Nitrogen => self.nitrogen = Some(value),
            SoilParameter::Phosphorus => self.phosphorus = Some(value),
            SoilParameter::Potassium => self.potassium = Some(value),
            SoilParameter::Co2 => self.co2 = Some(value),
            SoilParameter::Temperature => self.temperature = Some(value),
            SoilParameter::Moisture => self.moisture = Some(value),
            SoilParameter::Ph => self.ph = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        SoilParameter::ALL.iter().all(|p| self.value(*p).is_none())
    }
}

impl From<&SensorReading> for PartialReading {
    fn from(reading: &SensorReading) -> Self {
        Self {
            nitrogen: Some(reading.nitrogen),
            phosphorus: Some(reading.phosphorus),
            potassium: Some(reading.potassium),
            co2: Some(reading.co2),
            temperature: Some(reading.temperature),
            moisture: Some(reading.moisture),
            ph: Some(reading.ph),
        }
    }
}

impl From<SensorReading> for PartialReading {
    fn from(reading: SensorReading) -> Self {
        (&reading).into()
    }
}

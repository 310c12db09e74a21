//! Agronomic reference ranges for soil parameters
//!
//! Three distinct tables are kept apart on purpose: the optimal band used by
//! health scoring, the wider acceptable band used by rule-based anomaly
//! detection, and the critical-factor thresholds, which exist in two named
//! profiles selectable through configuration.

use crate::types::{ParameterRange, SoilParameter};

/// Optimal band plus scoring weight for one parameter.
#[derive(Debug, Clone, Copy)]
pub struct ScoringBand {
    pub range: ParameterRange,
    pub weight: f64,
}

/// Optimal range and weight used by the health index.
pub fn optimal_band(param: SoilParameter) -> ScoringBand {
    match param {
        SoilParameter::Nitrogen => ScoringBand {
            range: ParameterRange::new(15.0, 30.0),
            weight: 1.0,
        },
        SoilParameter::Phosphorus => ScoringBand {
            range: ParameterRange::new(10.0, 25.0),
            weight: 1.0,
        },
        SoilParameter::Potassium => ScoringBand {
            range: ParameterRange::new(100.0, 200.0),
            weight: 1.0,
        },
        SoilParameter::Co2 => ScoringBand {
            range: ParameterRange::new(400.0, 600.0),
            weight: 0.8,
        },
        SoilParameter::Temperature => ScoringBand {
            range: ParameterRange::new(15.0, 25.0),
            weight: 0.9,
        },
        SoilParameter::Moisture => ScoringBand {
            range: ParameterRange::new(40.0, 60.0),
            weight: 1.0,
        },
        SoilParameter::Ph => ScoringBand {
            range: ParameterRange::new(6.5, 7.5),
            weight: 1.0,
        },
    }
}

/// Acceptable band used by the rule-based anomaly detector.
///
/// Wider than the optimal band; a value outside it is treated as a sensor
/// anomaly rather than merely suboptimal soil.
pub fn acceptable_range(param: SoilParameter) -> ParameterRange {
    match param {
        SoilParameter::Nitrogen => ParameterRange::new(10.0, 40.0),
        SoilParameter::Phosphorus => ParameterRange::new(5.0, 35.0),
        SoilParameter::Potassium => ParameterRange::new(50.0, 300.0),
        SoilParameter::Co2 => ParameterRange::new(300.0, 800.0),
        SoilParameter::Temperature => ParameterRange::new(10.0, 30.0),
        SoilParameter::Moisture => ParameterRange::new(30.0, 70.0),
        SoilParameter::Ph => ParameterRange::new(5.0, 8.0),
    }
}

/// Named critical-factor threshold profiles.
///
/// The deployed fleets disagree on which band should flag a factor as
/// critical, so both tables are preserved and the active one is chosen in
/// configuration. `Optimal` flags anything outside the optimal band;
/// `Extended` flags only values outside the wider tolerance band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CriticalProfile {
    #[default]
    Optimal,
    Extended,
}

impl CriticalProfile {
    /// Band outside which a parameter is reported as a critical factor.
    pub fn range(&self, param: SoilParameter) -> ParameterRange {
        match self {
            CriticalProfile::Optimal => optimal_band(param).range,
            CriticalProfile::Extended => match param {
                SoilParameter::Nitrogen => ParameterRange::new(10.0, 40.0),
                SoilParameter::Phosphorus => ParameterRange::new(5.0, 35.0),
                SoilParameter::Potassium => ParameterRange::new(50.0, 300.0),
                SoilParameter::Co2 => ParameterRange::new(300.0, 800.0),
                SoilParameter::Temperature => ParameterRange::new(10.0, 30.0),
                SoilParameter::Moisture => ParameterRange::new(30.0, 70.0),
                SoilParameter::Ph => ParameterRange::new(6.0, 8.0),
            },
        }
    }

    /// Parse a profile name from configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "optimal" => Some(CriticalProfile::Optimal),
            "extended" => Some(CriticalProfile::Extended),
            _ => None,
        }
    }
}

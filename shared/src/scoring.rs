//! Soil health scoring core
//!
//! Pure functions over a reading: health index, status, rule-based anomaly
//! detection and critical-factor identification. All of them tolerate absent
//! parameters and never panic on finite numeric input.

use chrono::Utc;

use crate::models::{AnalysisResult, HealthStatus, PartialReading, SensorReading};
use crate::ranges::{acceptable_range, optimal_band, CriticalProfile};
use crate::types::SoilParameter;

/// Index reported when a reading carries no parameters at all.
const EMPTY_READING_INDEX: i32 = 50;

/// Score a single parameter value against its optimal band.
///
/// Inside the band the score is a triangular peak: 100 at the midpoint,
/// decaying linearly to 0 at either boundary. Outside the band the score is
/// 100 minus 5 points per unit of distance from the nearest boundary,
/// floored at 0.
pub fn parameter_score(param: SoilParameter, value: f64) -> f64 {
    let range = optimal_band(param).range;
    if range.contains(value) {
        let distance = (value - range.midpoint()).abs();
        (1.0 - distance / (range.width() / 2.0)) * 100.0
    } else if value < range.min {
        (100.0 - (range.min - value) * 5.0).max(0.0)
    } else {
        (100.0 - (value - range.max) * 5.0).max(0.0)
    }
}

/// Weighted health index over the present parameters, clamped to [1,100].
///
/// Absent parameters are excluded from both the numerator and the weight
/// total; an entirely empty reading scores 50.
pub fn health_index(reading: &PartialReading) -> i32 {
    let mut score = 0.0;
    let mut total_weight = 0.0;

    for param in SoilParameter::ALL {
        if let Some(value) = reading.value(param) {
            let band = optimal_band(param);
            score += parameter_score(param, value) * band.weight;
            total_weight += band.weight;
        }
    }

    let index = if total_weight > 0.0 {
        // Round, don't truncate: a reading of perfect midpoints must not
        // land on 99 because the weight total is inexact in binary.
        (score / total_weight).round() as i32
    } else {
        EMPTY_READING_INDEX
    };

    index.clamp(1, 100)
}

/// Health index together with its status band.
pub fn health_report(reading: &PartialReading) -> (i32, HealthStatus) {
    let index = health_index(reading);
    (index, HealthStatus::from_index(index))
}

/// Outcome of anomaly detection on one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnomalyVerdict {
    pub is_anomalous: bool,
    /// Severity in [0,1].
    pub score: f64,
}

impl AnomalyVerdict {
    pub fn normal() -> Self {
        Self {
            is_anomalous: false,
            score: 0.0,
        }
    }
}

/// Interchangeable anomaly detection strategies.
///
/// The rule-based detector is the deterministic default; a fitted outlier
/// model can be swapped in behind the same interface.
pub trait AnomalyDetector: Send + Sync {
    fn detect(&self, reading: &PartialReading) -> AnomalyVerdict;
}

/// Default detector: flags any parameter outside its acceptable band.
///
/// Severity of a violation is the relative deviation beyond the boundary,
/// capped at 1.0; the reported score is the worst violation averaged over
/// the full parameter count, so a single bad sensor cannot saturate it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedDetector;

impl AnomalyDetector for RuleBasedDetector {
    fn detect(&self, reading: &PartialReading) -> AnomalyVerdict {
        let mut is_anomalous = false;
        let mut worst: f64 = 0.0;

        for param in SoilParameter::ALL {
            let Some(value) = reading.value(param) else {
                continue;
            };
            let range = acceptable_range(param);
            if !range.contains(value) {
                is_anomalous = true;
                let deviation = if value < range.min {
                    (range.min - value) / range.min
                } else {
                    (value - range.max) / range.max
                };
                worst = worst.max(deviation.abs().min(1.0));
            }
        }

        if !is_anomalous {
            return AnomalyVerdict::normal();
        }

        AnomalyVerdict {
            is_anomalous,
            score: (worst / SoilParameter::ALL.len() as f64).clamp(0.0, 1.0),
        }
    }
}

/// Names of the parameters outside the active critical band, in declaration
/// order. Empty iff every present parameter is inside its band.
pub fn critical_factors(reading: &PartialReading, profile: CriticalProfile) -> Vec<String> {
    SoilParameter::ALL
        .iter()
        .filter_map(|&param| {
            let value = reading.value(param)?;
            let range = profile.range(param);
            (!range.contains(value)).then(|| param.display_name().to_string())
        })
        .collect()
}

/// Full analysis of one reading: health index, status, anomaly verdict and
/// critical factors, stamped with the analysis time.
pub fn analyze(
    reading: &SensorReading,
    detector: &dyn AnomalyDetector,
    profile: CriticalProfile,
) -> AnalysisResult {
    let partial = PartialReading::from(reading);
    let (health_index, health_status) = health_report(&partial);
    let verdict = detector.detect(&partial);

    AnalysisResult {
        timestamp: Utc::now(),
        health_index,
        health_status,
        is_anomalous: verdict.is_anomalous,
        anomaly_score: verdict.score,
        critical_factors: critical_factors(&partial, profile),
        reading: *reading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn midpoint_reading() -> PartialReading {
        let mut reading = PartialReading::default();
        for param in SoilParameter::ALL {
            reading.set(param, optimal_band(param).range.midpoint());
        }
        reading
    }

    #[test]
    fn midpoints_score_a_perfect_index() {
        let (index, status) = health_report(&midpoint_reading());
        assert_eq!(index, 100);
        assert_eq!(status, HealthStatus::Excellent);
    }

    #[test]
    fn empty_reading_defaults_to_fifty() {
        assert_eq!(health_index(&PartialReading::default()), 50);
    }

    #[test]
    fn absent_parameters_are_excluded_not_zeroed() {
        let mut reading = PartialReading::default();
        reading.set(SoilParameter::Ph, 7.0);
        // A lone perfect pH must give a perfect index, not one dragged
        // down by six phantom zeros.
        assert_eq!(health_index(&reading), 100);
    }

    #[test]
    fn in_range_reading_is_not_anomalous() {
        let verdict = RuleBasedDetector.detect(&midpoint_reading());
        assert!(!verdict.is_anomalous);
        assert_eq!(verdict.score, 0.0);
    }

    proptest! {
        #[test]
        fn health_index_stays_in_bounds(
            n in -1e4f64..1e4,
            p in -1e4f64..1e4,
            k in -1e4f64..1e4,
            co2 in -1e4f64..1e4,
            temp in -1e3f64..1e3,
            moisture in -1e3f64..1e3,
            ph in -1e2f64..1e2,
        ) {
            let reading = PartialReading {
                nitrogen: Some(n),
                phosphorus: Some(p),
                potassium: Some(k),
                co2: Some(co2),
                temperature: Some(temp),
                moisture: Some(moisture),
                ph: Some(ph),
            };
            let index = health_index(&reading);
            prop_assert!((1..=100).contains(&index));
        }

        #[test]
        fn anomaly_score_stays_in_unit_interval(
            n in -1e4f64..1e4,
            temp in -1e3f64..1e3,
            ph in -1e2f64..1e2,
        ) {
            let reading = PartialReading {
                nitrogen: Some(n),
                temperature: Some(temp),
                ph: Some(ph),
                ..Default::default()
            };
            let verdict = RuleBasedDetector.detect(&reading);
            prop_assert!((0.0..=1.0).contains(&verdict.score));
        }
    }
}

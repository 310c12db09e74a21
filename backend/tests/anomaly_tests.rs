//! Tests for rule-based anomaly detection
//! Verifies the flag/score contract: flagged iff any parameter leaves its
//! acceptable band, score always inside [0,1].

use shared::{
    acceptable_range, AnomalyDetector, AnomalySeverity, PartialReading, RuleBasedDetector,
    SoilParameter,
};

fn in_band_reading() -> PartialReading {
    let mut partial = PartialReading::default();
    for param in SoilParameter::ALL {
        partial.set(param, acceptable_range(param).midpoint());
    }
    partial
}

// =============================================================================
// Flag Semantics
// =============================================================================

mod flag_semantics {
    use super::*;

    #[test]
    fn in_band_reading_is_not_anomalous() {
        let verdict = RuleBasedDetector.detect(&in_band_reading());
        assert!(!verdict.is_anomalous);
        assert_eq!(verdict.score, 0.0);
    }

    #[test]
    fn empty_reading_is_not_anomalous() {
        let verdict = RuleBasedDetector.detect(&PartialReading::default());
        assert!(!verdict.is_anomalous);
        assert_eq!(verdict.score, 0.0);
    }

    #[test]
    fn one_violation_flips_the_flag_and_score() {
        let mut partial = in_band_reading();
        partial.set(SoilParameter::Temperature, 45.0);

        let verdict = RuleBasedDetector.detect(&partial);
        assert!(verdict.is_anomalous);
        assert!(verdict.score > 0.0);
    }

    #[test]
    fn boundary_values_are_still_acceptable() {
        let mut partial = in_band_reading();
        let range = acceptable_range(SoilParameter::Ph);
        partial.set(SoilParameter::Ph, range.min);
        assert!(!RuleBasedDetector.detect(&partial).is_anomalous);

        partial.set(SoilParameter::Ph, range.max);
        assert!(!RuleBasedDetector.detect(&partial).is_anomalous);

        partial.set(SoilParameter::Ph, range.max + 0.01);
        assert!(RuleBasedDetector.detect(&partial).is_anomalous);
    }

    #[test]
    fn missing_parameters_cannot_trip_the_detector() {
        let mut partial = PartialReading::default();
        partial.set(SoilParameter::Nitrogen, 25.0);
        let verdict = RuleBasedDetector.detect(&partial);
        assert!(!verdict.is_anomalous);
    }
}

// =============================================================================
// Score Bounds and Growth
// =============================================================================

mod score_bounds {
    use super::*;

    #[test]
    fn score_stays_in_unit_interval_for_wild_values() {
        let wild = [
            (SoilParameter::Nitrogen, -5000.0),
            (SoilParameter::Co2, 1e9),
            (SoilParameter::Ph, -3.0),
            (SoilParameter::Moisture, 100000.0),
        ];
        for (param, value) in wild {
            let mut partial = in_band_reading();
            partial.set(param, value);
            let verdict = RuleBasedDetector.detect(&partial);
            assert!(
                (0.0..=1.0).contains(&verdict.score),
                "score {} out of bounds for {param:?}",
                verdict.score
            );
            assert!(verdict.is_anomalous);
        }
    }

    #[test]
    fn severity_grows_with_deviation() {
        let range = acceptable_range(SoilParameter::Moisture);

        let mut slight = in_band_reading();
        slight.set(SoilParameter::Moisture, range.max + 5.0);

        let mut severe = in_band_reading();
        severe.set(SoilParameter::Moisture, range.max + 60.0);

        let slight_score = RuleBasedDetector.detect(&slight).score;
        let severe_score = RuleBasedDetector.detect(&severe).score;
        assert!(severe_score > slight_score);
    }

    #[test]
    fn relative_deviation_is_averaged_over_the_parameter_count() {
        // A violation at twice the upper bound has relative deviation 1.0;
        // spreading it over the seven parameters caps the score at 1/7.
        let mut partial = in_band_reading();
        let range = acceptable_range(SoilParameter::Nitrogen);
        partial.set(SoilParameter::Nitrogen, range.max * 2.0);

        let verdict = RuleBasedDetector.detect(&partial);
        let expected = 1.0 / SoilParameter::ALL.len() as f64;
        assert!((verdict.score - expected).abs() < 1e-9);
    }
}

// =============================================================================
// Severity Bands
// =============================================================================

mod severity_bands {
    use super::*;

    #[test]
    fn severity_thresholds() {
        assert_eq!(AnomalySeverity::from_score(0.1), AnomalySeverity::Low);
        assert_eq!(AnomalySeverity::from_score(0.4), AnomalySeverity::Low);
        assert_eq!(AnomalySeverity::from_score(0.5), AnomalySeverity::Medium);
        assert_eq!(AnomalySeverity::from_score(0.7), AnomalySeverity::Medium);
        assert_eq!(AnomalySeverity::from_score(0.9), AnomalySeverity::High);
    }
}

//! Fitted statistical outlier detector
//!
//! Optional alternative to the rule-based anomaly detector: per-parameter
//! location/scale statistics fitted offline on historical readings and
//! loaded from a JSON artifact. The decision function is the maximum
//! absolute z-score over the present parameters, mapped onto [0,1] by
//! saturating at six standard deviations.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use shared::{AnomalyDetector, AnomalyVerdict, PartialReading, SoilParameter};

/// Z-score at which the anomaly score saturates to 1.0.
const Z_SATURATION: f64 = 6.0;

/// Fitted statistics artifact, keyed by wire field name.
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyStats {
    /// Score above which a reading is flagged.
    pub threshold: f64,
    pub parameters: BTreeMap<String, ParameterStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParameterStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Outlier detector backed by fitted statistics.
#[derive(Debug, Clone)]
pub struct FittedOutlierDetector {
    stats: AnomalyStats,
}

impl FittedOutlierDetector {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading anomaly statistics {}", path.display()))?;
        let stats: AnomalyStats = serde_json::from_str(&raw)
            .with_context(|| format!("parsing anomaly statistics {}", path.display()))?;

        anyhow::ensure!(
            (0.0..=1.0).contains(&stats.threshold),
            "anomaly threshold must lie in [0,1]"
        );
        for (name, p) in &stats.parameters {
            anyhow::ensure!(p.std_dev > 0.0, "std_dev for {name} must be positive");
        }

        Ok(Self { stats })
    }

    pub fn from_stats(stats: AnomalyStats) -> Self {
        Self { stats }
    }
}

impl AnomalyDetector for FittedOutlierDetector {
    fn detect(&self, reading: &PartialReading) -> AnomalyVerdict {
        let mut max_z: f64 = 0.0;

        for param in SoilParameter::ALL {
            let Some(value) = reading.value(param) else {
                continue;
            };
            let Some(stats) = self.stats.parameters.get(param.key()) else {
                continue;
            };
            let z = ((value - stats.mean) / stats.std_dev).abs();
            max_z = max_z.max(z);
        }

        let score = (max_z / Z_SATURATION).clamp(0.0, 1.0);
        AnomalyVerdict {
            is_anomalous: score > self.stats.threshold,
            score,
        }
    }
}

//! Analysis result models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::reading::SensorReading;

/// Five-level health status derived from the health index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthStatus {
    /// Map a health index (1-100) onto its status band.
    pub fn from_index(index: i32) -> Self {
        if index >= 75 {
            HealthStatus::Excellent
        } else if index >= 60 {
            HealthStatus::Good
        } else if index >= 45 {
            HealthStatus::Fair
        } else if index >= 30 {
            HealthStatus::Poor
        } else {
            HealthStatus::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Excellent",
            HealthStatus::Good => "Good",
            HealthStatus::Fair => "Fair",
            HealthStatus::Poor => "Poor",
            HealthStatus::Critical => "Critical",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "Excellent" => HealthStatus::Excellent,
            "Good" => HealthStatus::Good,
            "Fair" => HealthStatus::Fair,
            "Poor" => HealthStatus::Poor,
            _ => HealthStatus::Critical,
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity band for an anomaly score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

impl AnomalySeverity {
    pub fn from_score(score: f64) -> Self {
        if score > 0.7 {
            AnomalySeverity::High
        } else if score > 0.4 {
            AnomalySeverity::Medium
        } else {
            AnomalySeverity::Low
        }
    }
}

/// Complete analysis of one sensor reading.
///
/// Computed once, never mutated; persisted alongside its source reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "soil_health_index")]
    pub health_index: i32,
    pub health_status: HealthStatus,
    pub is_anomalous: bool,
    pub anomaly_score: f64,
    pub critical_factors: Vec<String>,
    #[serde(rename = "sensor_readings")]
    pub reading: SensorReading,
}

/// Aggregate statistics over stored readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilStats {
    pub total_readings: u64,
    pub average_health_index: f64,
    pub anomaly_count: u64,
    pub anomaly_percentage: f64,
    pub status_distribution: BTreeMap<String, u64>,
}

impl SoilStats {
    pub fn empty() -> Self {
        Self {
            total_readings: 0,
            average_health_index: 0.0,
            anomaly_count: 0,
            anomaly_percentage: 0.0,
            status_distribution: BTreeMap::new(),
        }
    }
}

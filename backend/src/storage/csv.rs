//! CSV mirror of the analysis store
//!
//! Appends one row per analyzed reading with the same logical schema as the
//! MySQL table, and serves reads when the database is unavailable. The file
//! keeps two-decimal precision for sensor values, matching what the sensor
//! firmware emits.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared::{AnalysisResult, HealthStatus, SensorReading, SoilStats};

use crate::error::{AppError, AppResult};
use crate::storage::AnalysisSink;

/// Flat-file analysis store
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

/// One CSV row; column order matches the original mirror files.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRecord {
    timestamp: DateTime<Utc>,
    #[serde(rename = "N")]
    n: f64,
    #[serde(rename = "P")]
    p: f64,
    #[serde(rename = "K")]
    k: f64,
    #[serde(rename = "CO2")]
    co2: f64,
    #[serde(rename = "Temperature")]
    temperature: f64,
    #[serde(rename = "Moisture")]
    moisture: f64,
    #[serde(rename = "pH")]
    ph: f64,
    health_index: i32,
    health_status: String,
    is_anomalous: bool,
    anomaly_score: f64,
    /// JSON-encoded list of factor names.
    critical_factors: String,
}

impl From<&AnalysisResult> for CsvRecord {
    fn from(analysis: &AnalysisResult) -> Self {
        let reading = analysis.reading.rounded();
        CsvRecord {
            timestamp: analysis.timestamp,
            n: reading.nitrogen,
            p: reading.phosphorus,
            k: reading.potassium,
            co2: reading.co2,
            temperature: reading.temperature,
            moisture: reading.moisture,
            ph: reading.ph,
            health_index: analysis.health_index,
            health_status: analysis.health_status.as_str().to_string(),
            is_anomalous: analysis.is_anomalous,
            anomaly_score: round4(analysis.anomaly_score),
            critical_factors: serde_json::to_string(&analysis.critical_factors)
                .unwrap_or_else(|_| "[]".to_string()),
        }
    }
}

impl From<CsvRecord> for AnalysisResult {
    fn from(record: CsvRecord) -> Self {
        AnalysisResult {
            timestamp: record.timestamp,
            health_index: record.health_index,
            health_status: HealthStatus::from_str_lossy(&record.health_status),
            is_anomalous: record.is_anomalous,
            anomaly_score: record.anomaly_score,
            critical_factors: serde_json::from_str(&record.critical_factors).unwrap_or_default(),
            reading: SensorReading {
                nitrogen: record.n,
                phosphorus: record.p,
                potassium: record.k,
                co2: record.co2,
                temperature: record.temperature,
                moisture: record.moisture,
                ph: record.ph,
            },
        }
    }
}

impl CsvStore {
    /// Create a store at `path`, creating the parent directory if needed.
    pub fn new(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::StorageError(format!("creating {parent:?}: {e}")))?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &CsvRecord) -> AppResult<()> {
        let write_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::StorageError(format!("opening {:?}: {e}", self.path)))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(write_header)
            .from_writer(file);
        writer
            .serialize(record)
            .and_then(|_| writer.flush().map_err(Into::into))
            .map_err(|e| AppError::StorageError(format!("writing {:?}: {e}", self.path)))
    }

    fn read_all(&self) -> AppResult<Vec<AnalysisResult>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| AppError::StorageError(format!("opening {:?}: {e}", self.path)))?;

        let mut results = Vec::new();
        for record in reader.deserialize::<CsvRecord>() {
            match record {
                Ok(record) => results.push(record.into()),
                // A torn row from a crashed writer must not hide the rest.
                Err(e) => tracing::warn!("Skipping unreadable CSV row: {e}"),
            }
        }
        Ok(results)
    }

    /// Most recent stored analysis.
    pub fn latest(&self) -> AppResult<Option<AnalysisResult>> {
        Ok(self.read_all()?.into_iter().last())
    }

    /// Newest-first history, bounded by `limit`.
    pub fn history(&self, limit: usize) -> AppResult<Vec<AnalysisResult>> {
        let all = self.read_all()?;
        Ok(all.into_iter().rev().take(limit).collect())
    }

    /// Aggregate statistics over all stored readings.
    pub fn stats(&self) -> AppResult<SoilStats> {
        let all = self.read_all()?;
        if all.is_empty() {
            return Ok(SoilStats::empty());
        }

        let total = all.len() as u64;
        let anomaly_count = all.iter().filter(|a| a.is_anomalous).count() as u64;
        let health_sum: i64 = all.iter().map(|a| a.health_index as i64).sum();

        let mut status_distribution = std::collections::BTreeMap::new();
        for analysis in &all {
            *status_distribution
                .entry(analysis.health_status.as_str().to_string())
                .or_insert(0u64) += 1;
        }

        Ok(SoilStats {
            total_readings: total,
            average_health_index: round2(health_sum as f64 / total as f64),
            anomaly_count,
            anomaly_percentage: round2(anomaly_count as f64 / total as f64 * 100.0),
            status_distribution,
        })
    }
}

#[async_trait]
impl AnalysisSink for CsvStore {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn store(&self, analysis: &AnalysisResult) -> AppResult<()> {
        self.append(&CsvRecord::from(analysis))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::HealthStatus;

    fn sample_analysis(health_index: i32, is_anomalous: bool) -> AnalysisResult {
        AnalysisResult {
            timestamp: Utc::now(),
            health_index,
            health_status: HealthStatus::from_index(health_index),
            is_anomalous,
            anomaly_score: if is_anomalous { 0.12 } else { 0.0 },
            critical_factors: if is_anomalous {
                vec!["Temperature".to_string(), "pH".to_string()]
            } else {
                Vec::new()
            },
            reading: shared::SensorReading {
                nitrogen: 22.11,
                phosphorus: 18.02,
                potassium: 150.55,
                co2: 500.4,
                temperature: 22.91,
                moisture: 55.01,
                ph: 7.21,
            },
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> CsvStore {
        CsvStore::new(dir.path().join("sensor_readings.csv")).unwrap()
    }

    #[tokio::test]
    async fn round_trip_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let analysis = sample_analysis(82, true);

        store.store(&analysis).await.unwrap();
        let restored = store.latest().unwrap().expect("one row stored");

        assert_eq!(restored.reading, analysis.reading.rounded());
        assert_eq!(restored.health_index, analysis.health_index);
        assert_eq!(restored.health_status, analysis.health_status);
        assert_eq!(restored.is_anomalous, analysis.is_anomalous);
        assert!((restored.anomaly_score - analysis.anomaly_score).abs() < 0.01);
        assert_eq!(restored.critical_factors, analysis.critical_factors);
        assert_eq!(
            restored.timestamp.timestamp(),
            analysis.timestamp.timestamp()
        );
    }

    #[tokio::test]
    async fn header_is_written_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.store(&sample_analysis(90, false)).await.unwrap();
        store.store(&sample_analysis(40, true)).await.unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        let header_lines = contents
            .lines()
            .filter(|line| line.starts_with("timestamp"))
            .count();
        assert_eq!(header_lines, 1);
        assert_eq!(store.history(10).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn history_is_newest_first_and_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        for index in [70, 80, 90] {
            store.store(&sample_analysis(index, false)).await.unwrap();
        }

        let history = store.history(2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].health_index, 90);
        assert_eq!(history[1].health_index, 80);
    }

    #[tokio::test]
    async fn stats_aggregate_stored_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.store(&sample_analysis(90, false)).await.unwrap();
        store.store(&sample_analysis(40, true)).await.unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_readings, 2);
        assert_eq!(stats.anomaly_count, 1);
        assert_eq!(stats.anomaly_percentage, 50.0);
        assert_eq!(stats.average_health_index, 65.0);
        assert_eq!(stats.status_distribution.get("Excellent"), Some(&1));
        assert_eq!(stats.status_distribution.get("Poor"), Some(&1));
    }

    #[test]
    fn empty_store_reads_back_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.latest().unwrap().is_none());
        assert!(store.history(10).unwrap().is_empty());
        assert_eq!(store.stats().unwrap().total_readings, 0);
    }
}

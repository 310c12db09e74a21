//! MySQL persistence for analyzed readings
//!
//! One row per analyzed reading with all derived fields. The schema is
//! created on startup when the server is reachable; when it is not, the
//! platform runs in CSV-only mode and this store is simply absent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::types::Json;
use std::time::Duration;

use shared::{AnalysisResult, HealthStatus, SensorReading, SoilStats};

use crate::config::DatabaseConfig;
use crate::error::AppResult;
use crate::storage::AnalysisSink;

/// MySQL-backed analysis store
#[derive(Clone)]
pub struct DatabaseStore {
    pool: MySqlPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ReadingRow {
    timestamp: DateTime<Utc>,
    n: f64,
    p: f64,
    k: f64,
    co2: f64,
    temperature: f64,
    moisture: f64,
    ph: f64,
    health_index: i32,
    health_status: String,
    is_anomalous: bool,
    anomaly_score: f64,
    critical_factors: Option<Json<Vec<String>>>,
}

impl From<ReadingRow> for AnalysisResult {
    fn from(row: ReadingRow) -> Self {
        AnalysisResult {
            timestamp: row.timestamp,
            health_index: row.health_index,
            health_status: HealthStatus::from_str_lossy(&row.health_status),
            is_anomalous: row.is_anomalous,
            anomaly_score: row.anomaly_score,
            critical_factors: row.critical_factors.map(|j| j.0).unwrap_or_default(),
            reading: SensorReading {
                nitrogen: row.n,
                phosphorus: row.p,
                potassium: row.k,
                co2: row.co2,
                temperature: row.temperature,
                moisture: row.moisture,
                ph: row.ph,
            },
        }
    }
}

const SELECT_COLUMNS: &str = "timestamp, N AS n, P AS p, K AS k, CO2 AS co2, \
     temperature, moisture, pH AS ph, health_index, health_status, \
     is_anomalous, anomaly_score, critical_factors";

impl DatabaseStore {
    /// Connect with a bounded acquire timeout.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Create the readings table when it does not exist yet.
    pub async fn init_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sensor_readings (
                id INT AUTO_INCREMENT PRIMARY KEY,
                timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                N DOUBLE NOT NULL,
                P DOUBLE NOT NULL,
                K DOUBLE NOT NULL,
                CO2 DOUBLE NOT NULL,
                temperature DOUBLE NOT NULL,
                moisture DOUBLE NOT NULL,
                pH DOUBLE NOT NULL,
                health_index INT NOT NULL,
                health_status VARCHAR(20) NOT NULL,
                is_anomalous BOOLEAN NOT NULL,
                anomaly_score DOUBLE NOT NULL,
                critical_factors JSON,
                INDEX idx_timestamp (timestamp)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Cheap connectivity probe for the health endpoint.
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Most recent stored analysis.
    pub async fn latest(&self) -> AppResult<Option<AnalysisResult>> {
        let row = sqlx::query_as::<_, ReadingRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sensor_readings \
             ORDER BY timestamp DESC, id DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Newest-first history, bounded by `limit`.
    pub async fn history(&self, limit: u32) -> AppResult<Vec<AnalysisResult>> {
        let rows = sqlx::query_as::<_, ReadingRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM sensor_readings \
             ORDER BY timestamp DESC, id DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Aggregate statistics over all stored readings.
    pub async fn stats(&self) -> AppResult<SoilStats> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sensor_readings")
            .fetch_one(&self.pool)
            .await?;

        if total == 0 {
            return Ok(SoilStats::empty());
        }

        let (avg_health,): (Option<f64>,) =
            sqlx::query_as("SELECT CAST(AVG(health_index) AS DOUBLE) FROM sensor_readings")
                .fetch_one(&self.pool)
                .await?;

        let (anomalies,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sensor_readings WHERE is_anomalous = 1")
                .fetch_one(&self.pool)
                .await?;

        let distribution: Vec<(String, i64)> = sqlx::query_as(
            "SELECT health_status, COUNT(*) FROM sensor_readings GROUP BY health_status",
        )
        .fetch_all(&self.pool)
        .await?;

        let total = total as u64;
        let anomaly_count = anomalies as u64;
        Ok(SoilStats {
            total_readings: total,
            average_health_index: round2(avg_health.unwrap_or(0.0)),
            anomaly_count,
            anomaly_percentage: round2(anomaly_count as f64 / total as f64 * 100.0),
            status_distribution: distribution
                .into_iter()
                .map(|(status, count)| (status, count as u64))
                .collect(),
        })
    }
}

#[async_trait]
impl AnalysisSink for DatabaseStore {
    fn name(&self) -> &'static str {
        "mysql"
    }

    async fn store(&self, analysis: &AnalysisResult) -> AppResult<()> {
        let reading = &analysis.reading;
        sqlx::query(
            r#"
            INSERT INTO sensor_readings
                (timestamp, N, P, K, CO2, temperature, moisture, pH,
                 health_index, health_status, is_anomalous, anomaly_score,
                 critical_factors)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(analysis.timestamp)
        .bind(reading.nitrogen)
        .bind(reading.phosphorus)
        .bind(reading.potassium)
        .bind(reading.co2)
        .bind(reading.temperature)
        .bind(reading.moisture)
        .bind(reading.ph)
        .bind(analysis.health_index)
        .bind(analysis.health_status.as_str())
        .bind(analysis.is_anomalous)
        .bind(analysis.anomaly_score)
        .bind(Json(&analysis.critical_factors))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

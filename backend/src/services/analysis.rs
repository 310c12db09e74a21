//! Soil analysis service
//!
//! Wraps the scoring core with the configured anomaly detector and the
//! persistence sinks. Scoring itself is pure; persistence is best-effort
//! per sink and isolated, so a MySQL outage never loses the CSV row and
//! vice versa.

use std::sync::Arc;

use async_trait::async_trait;
use shared::{
    scoring, AnalysisResult, AnomalyDetector, CriticalProfile, SensorReading, SoilStats,
};

use crate::error::AppResult;
use crate::storage::{AnalysisSink, CsvStore, DatabaseStore, StorageMode};
use crate::transport::{MessageHandler, ReadingMessage};

/// Analysis pipeline shared across handlers and the transport.
#[derive(Clone)]
pub struct AnalysisService {
    detector: Arc<dyn AnomalyDetector>,
    profile: CriticalProfile,
    db: Option<Arc<DatabaseStore>>,
    csv: Arc<CsvStore>,
    sinks: Arc<Vec<Arc<dyn AnalysisSink>>>,
}

impl AnalysisService {
    pub fn new(
        detector: Arc<dyn AnomalyDetector>,
        profile: CriticalProfile,
        db: Option<DatabaseStore>,
        csv: CsvStore,
    ) -> Self {
        let db = db.map(Arc::new);
        let csv = Arc::new(csv);

        let mut sinks: Vec<Arc<dyn AnalysisSink>> = Vec::new();
        if let Some(db) = &db {
            sinks.push(db.clone());
        }
        sinks.push(csv.clone());

        Self {
            detector,
            profile,
            db,
            csv,
            sinks: Arc::new(sinks),
        }
    }

    pub fn critical_profile(&self) -> CriticalProfile {
        self.profile
    }

    pub fn detector(&self) -> &dyn AnomalyDetector {
        self.detector.as_ref()
    }

    pub fn has_database(&self) -> bool {
        self.db.is_some()
    }

    /// Connectivity label for the health endpoint.
    pub async fn database_status(&self) -> &'static str {
        match &self.db {
            Some(db) => match db.ping().await {
                Ok(()) => "connected",
                Err(_) => "disconnected",
            },
            None => "csv-only",
        }
    }

    /// Score a reading without persisting it.
    pub fn analyze(&self, reading: &SensorReading) -> AnalysisResult {
        scoring::analyze(reading, self.detector.as_ref(), self.profile)
    }

    /// Score a reading and write it to every sink.
    pub async fn analyze_and_store(&self, reading: &SensorReading) -> AnalysisResult {
        let analysis = self.analyze(reading);
        self.persist(&analysis).await;
        analysis
    }

    /// Write to each sink in turn; failures are logged and isolated.
    pub async fn persist(&self, analysis: &AnalysisResult) {
        for sink in self.sinks.iter() {
            if let Err(e) = sink.store(analysis).await {
                tracing::warn!(sink = sink.name(), "Sink write failed: {e}");
            }
        }
    }

    /// Most recent stored analysis, falling back to the CSV mirror when the
    /// database is absent or failing.
    pub async fn latest(&self) -> AppResult<Option<(AnalysisResult, StorageMode)>> {
        if let Some(db) = &self.db {
            match db.latest().await {
                Ok(result) => return Ok(result.map(|r| (r, StorageMode::MySql))),
                Err(e) => tracing::warn!("Database read failed, serving from CSV: {e}"),
            }
        }
        Ok(self
            .csv
            .latest()?
            .map(|r| (r, StorageMode::CsvFallback)))
    }

    /// Newest-first history, bounded by `limit`.
    pub async fn history(&self, limit: u32) -> AppResult<(Vec<AnalysisResult>, StorageMode)> {
        if let Some(db) = &self.db {
            match db.history(limit).await {
                Ok(results) => return Ok((results, StorageMode::MySql)),
                Err(e) => tracing::warn!("Database read failed, serving from CSV: {e}"),
            }
        }
        Ok((self.csv.history(limit as usize)?, StorageMode::CsvFallback))
    }

    /// Aggregate statistics over stored readings.
    pub async fn stats(&self) -> AppResult<(SoilStats, StorageMode)> {
        if let Some(db) = &self.db {
            match db.stats().await {
                Ok(stats) => return Ok((stats, StorageMode::MySql)),
                Err(e) => tracing::warn!("Database read failed, serving from CSV: {e}"),
            }
        }
        Ok((self.csv.stats()?, StorageMode::CsvFallback))
    }

    /// Seed value for the reading generator: continue from stored history
    /// when any exists.
    pub async fn last_stored_reading(&self) -> Option<SensorReading> {
        match self.latest().await {
            Ok(stored) => stored.map(|(analysis, _)| analysis.reading),
            Err(e) => {
                tracing::warn!("Could not load last stored reading: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl MessageHandler for AnalysisService {
    async fn handle(&self, message: ReadingMessage) {
        let analysis = self.analyze_and_store(&message.sensor_readings).await;
        tracing::info!(
            publisher_id = %message.publisher_id,
            health_index = analysis.health_index,
            health_status = %analysis.health_status,
            is_anomalous = analysis.is_anomalous,
            "Processed transported reading"
        );
        if !analysis.critical_factors.is_empty() {
            tracing::info!(
                critical_factors = ?analysis.critical_factors,
                "Reading has critical factors"
            );
        }
    }
}

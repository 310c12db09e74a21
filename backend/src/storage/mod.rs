//! Persistence sinks for analyzed readings
//!
//! The durable store and the flat-file mirror are independent sinks behind
//! one interface. They are always both invoked, sequentially and
//! best-effort; a failure in one never blocks the other.

use async_trait::async_trait;
use serde::Serialize;
use shared::AnalysisResult;

use crate::error::AppResult;

pub mod csv;
pub mod database;

pub use self::csv::CsvStore;
pub use database::DatabaseStore;

/// A destination for analyzed readings.
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Persist one analysis. Implementations must not retry internally;
    /// the caller decides what a failure means.
    async fn store(&self, analysis: &AnalysisResult) -> AppResult<()>;
}

/// Which backend served a read.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum StorageMode {
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "csv-fallback")]
    CsvFallback,
}

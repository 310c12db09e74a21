//! HTTP handlers for soil health endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared::{
    optimal_band, parse_reading, scoring, AnalysisResult, AnomalySeverity, PartialReading,
    SoilParameter, SoilStats,
};

use crate::error::{AppError, AppResult};
use crate::storage::StorageMode;
use crate::AppState;

/// Analyze a sensor reading, persist it and return the full result.
pub async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Json<AnalysisResult>> {
    let reading = parse_reading(&payload)?;
    let analysis = state.analysis.analyze_and_store(&reading).await;
    Ok(Json(analysis))
}

#[derive(Debug, Deserialize)]
pub struct BatchAnalyzeRequest {
    pub readings: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct BatchAnalyzeResponse {
    pub count: usize,
    pub analyses: Vec<AnalysisResult>,
}

/// Analyze multiple readings in one request without persisting them.
pub async fn batch_analyze(
    State(state): State<AppState>,
    Json(request): Json<BatchAnalyzeRequest>,
) -> AppResult<Json<BatchAnalyzeResponse>> {
    let mut analyses = Vec::with_capacity(request.readings.len());

    for (index, payload) in request.readings.iter().enumerate() {
        let reading = parse_reading(payload).map_err(|e| AppError::Validation {
            field: format!("readings[{index}]"),
            message: e.to_string(),
        })?;
        analyses.push(state.analysis.analyze(&reading));
    }

    Ok(Json(BatchAnalyzeResponse {
        count: analyses.len(),
        analyses,
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthIndexResponse {
    pub health_index: i32,
    pub health_status: shared::HealthStatus,
    pub scale: &'static str,
}

/// Compute only the health index for a reading.
pub async fn health_index(
    State(_state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Json<HealthIndexResponse>> {
    let reading = parse_reading(&payload)?;
    let (index, status) = scoring::health_report(&PartialReading::from(&reading));
    Ok(Json(HealthIndexResponse {
        health_index: index,
        health_status: status,
        scale: "1-100",
    }))
}

#[derive(Debug, Serialize)]
pub struct AnomalyResponse {
    pub is_anomalous: bool,
    pub anomaly_score: f64,
    pub severity: AnomalySeverity,
}

/// Run only anomaly detection on a reading.
pub async fn anomaly(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Json<AnomalyResponse>> {
    let reading = parse_reading(&payload)?;
    let verdict = state
        .analysis
        .detector()
        .detect(&PartialReading::from(&reading));
    Ok(Json(AnomalyResponse {
        is_anomalous: verdict.is_anomalous,
        anomaly_score: verdict.score,
        severity: AnomalySeverity::from_score(verdict.score),
    }))
}

#[derive(Debug, Serialize)]
pub struct CriticalFactorsResponse {
    pub critical_factors: Vec<String>,
    pub factor_count: usize,
    pub status: &'static str,
}

/// List the parameters outside their critical ranges.
pub async fn critical_factors(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> AppResult<Json<CriticalFactorsResponse>> {
    let reading = parse_reading(&payload)?;
    let factors = scoring::critical_factors(
        &PartialReading::from(&reading),
        state.analysis.critical_profile(),
    );
    let status = if factors.is_empty() {
        "Healthy"
    } else {
        "Needs Attention"
    };
    Ok(Json(CriticalFactorsResponse {
        factor_count: factors.len(),
        critical_factors: factors,
        status,
    }))
}

/// Reference table of optimal parameter ranges.
pub async fn optimal_ranges() -> Json<Value> {
    let mut ranges = serde_json::Map::new();
    for param in SoilParameter::ALL {
        let band = optimal_band(param);
        ranges.insert(
            param.key().to_string(),
            serde_json::json!({
                "min": band.range.min,
                "max": band.range.max,
                "unit": param.unit(),
                "description": param.description(),
            }),
        );
    }
    Json(serde_json::json!({ "optimal_ranges": ranges }))
}

#[derive(Debug, Serialize)]
pub struct StoredAnalysisResponse {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub mode: StorageMode,
}

/// Most recent stored analysis.
pub async fn latest(State(state): State<AppState>) -> AppResult<Json<StoredAnalysisResponse>> {
    let (analysis, mode) = state
        .analysis
        .latest()
        .await?
        .ok_or_else(|| AppError::NotFound("Readings".to_string()))?;
    Ok(Json(StoredAnalysisResponse { analysis, mode }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub total: usize,
    pub readings: Vec<AnalysisResult>,
    pub mode: StorageMode,
}

/// Newest-first reading history, default last 100.
pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> AppResult<Json<HistoryResponse>> {
    let limit = params.limit.unwrap_or(100);
    let (readings, mode) = state.analysis.history(limit).await?;
    Ok(Json(HistoryResponse {
        total: readings.len(),
        readings,
        mode,
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: SoilStats,
    pub mode: StorageMode,
}

/// Aggregate statistics over stored readings.
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<StatsResponse>> {
    let (stats, mode) = state.analysis.stats().await?;
    Ok(Json(StatsResponse { stats, mode }))
}

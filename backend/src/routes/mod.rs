//! Route definitions for the Soil Health Monitoring Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Soil health analysis
        .nest("/soil-health", soil_health_routes())
        // Crop recommendation
        .nest("/crops", crop_routes())
}

/// Soil health analysis routes
fn soil_health_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/batch-analyze", post(handlers::batch_analyze))
        .route("/health-index", post(handlers::health_index))
        .route("/anomaly", post(handlers::anomaly))
        .route("/critical-factors", post(handlers::critical_factors))
        .route("/optimal-ranges", get(handlers::optimal_ranges))
        .route("/latest", get(handlers::latest))
        .route("/history", get(handlers::history))
        .route("/stats", get(handlers::stats))
}

/// Crop recommendation routes
fn crop_routes() -> Router<AppState> {
    Router::new()
        .route("/recommend", post(handlers::recommend_crops))
        .route("/:slug", get(handlers::crop_details))
}

//! HTTP handlers for crop recommendation endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use validator::Validate;

use shared::{validate_location, CropProfile};

use crate::error::{AppError, AppResult};
use crate::services::crop::CropRecommendationResponse;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CropRecommendationRequest {
    #[validate(length(min = 1, max = 100))]
    pub location: String,
}

/// Rank crops for a location using live weather and the regional dataset.
pub async fn recommend_crops(
    State(state): State<AppState>,
    Json(request): Json<CropRecommendationRequest>,
) -> AppResult<Json<CropRecommendationResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        field: "location".to_string(),
        message: e.to_string(),
    })?;
    validate_location(&request.location).map_err(|message| AppError::Validation {
        field: "location".to_string(),
        message: message.to_string(),
    })?;

    let response = state.crop.recommend(request.location.trim()).await?;
    Ok(Json(response))
}

/// Static crop profile by slug.
pub async fn crop_details(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<CropProfile>> {
    let profile = state.crop.crop_details(&slug)?;
    Ok(Json(profile))
}

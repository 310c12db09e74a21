//! Error handling for the Soil Health Monitoring Platform
//!
//! Every failure surfaces as a structured JSON body; internal detail never
//! leaks past the 500 boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Missing required fields: {required:?}")]
    MissingFields { required: Vec<&'static str> },

    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // External service errors
    #[error("Weather service unavailable")]
    WeatherServiceUnavailable,

    #[error("Crop recommender unavailable: {0}")]
    RecommenderUnavailable(String),

    #[error("Model schema mismatch: {0}")]
    SchemaMismatch(String),

    // Persistence errors
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<&'static str>>,
}

impl ErrorDetail {
    fn new(code: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            message,
            field: None,
            required: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::MissingFields { required } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "MISSING_FIELDS".to_string(),
                    message: "Missing required fields".to_string(),
                    field: None,
                    required: Some(required.clone()),
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                    required: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{resource} not found")),
            ),
            AppError::WeatherServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new(
                    "WEATHER_SERVICE_UNAVAILABLE",
                    "Weather service is temporarily unavailable".to_string(),
                ),
            ),
            AppError::RecommenderUnavailable(reason) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new(
                    "RECOMMENDER_UNAVAILABLE",
                    format!("Crop recommendation is unavailable: {reason}"),
                ),
            ),
            AppError::SchemaMismatch(detail) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "MODEL_SCHEMA_MISMATCH",
                    format!("Feature vector incompatible with model schema: {detail}"),
                ),
            ),
            AppError::StorageError(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail::new("STORAGE_ERROR", format!("Storage error: {msg}")),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred".to_string()),
            ),
            AppError::Internal(_) | AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                ),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

impl From<shared::ReadingError> for AppError {
    fn from(err: shared::ReadingError) -> Self {
        match err {
            shared::ReadingError::MissingFields(required) => AppError::MissingFields { required },
            shared::ReadingError::InvalidValue { field, message } => AppError::Validation {
                field: field.to_string(),
                message,
            },
        }
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

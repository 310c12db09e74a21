//! Soil Health Monitoring Platform - Backend Server
//!
//! Ingests soil sensor readings, scores them against agronomic reference
//! ranges, persists results to MySQL and a CSV mirror, and serves crop
//! recommendations driven by live weather data.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shared::AnomalyDetector;

mod config;
mod error;
mod external;
mod generator;
mod handlers;
mod ml;
mod models;
mod routes;
mod services;
mod storage;
mod transport;

pub use config::Config;

use crate::external::WeatherClient;
use crate::ml::FittedOutlierDetector;
use crate::services::{AnalysisService, CropService};
use crate::storage::{CsvStore, DatabaseStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analysis: AnalysisService,
    pub crop: CropService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shm_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Soil Health Monitoring Server");
    tracing::info!("Environment: {}", config.environment);

    // Connect to MySQL, degrading to CSV-only storage when unreachable
    let db = match DatabaseStore::connect(&config.database).await {
        Ok(store) => match store.init_schema().await {
            Ok(()) => {
                tracing::info!("Database connection established");
                Some(store)
            }
            Err(e) => {
                tracing::warn!("Database schema setup failed: {e}");
                tracing::warn!("Falling back to CSV-only storage");
                None
            }
        },
        Err(e) => {
            tracing::warn!("Database connection failed: {e}");
            tracing::warn!("Falling back to CSV-only storage");
            None
        }
    };

    // Flat-file mirror, written regardless of database availability
    let csv = CsvStore::new(&config.storage.csv_path)?;

    // Anomaly detection: fitted statistics when present, rules otherwise
    let detector: Arc<dyn AnomalyDetector> =
        match FittedOutlierDetector::load(std::path::Path::new(
            &config.recommender.anomaly_stats_path,
        )) {
            Ok(detector) => {
                tracing::info!("Using fitted outlier detector");
                Arc::new(detector)
            }
            Err(e) => {
                tracing::debug!("Fitted anomaly statistics not loaded ({e}), using rule-based detector");
                Arc::new(shared::RuleBasedDetector)
            }
        };

    tracing::info!("CSV mirror at {}", csv.path().display());

    let analysis = AnalysisService::new(
        detector,
        config.scoring.critical_profile()?,
        db,
        csv,
    );

    if analysis.has_database() {
        tracing::info!("Persistence: MySQL + CSV mirror");
    } else {
        tracing::info!("Persistence: CSV only");
    }

    // Crop recommender artifacts; absence degrades the crop endpoints
    let weather = WeatherClient::with_base_url(
        config.weather.api_key.clone(),
        config.weather.api_endpoint.clone(),
        Duration::from_secs(config.weather.timeout_secs),
    );
    let crop = CropService::load(&config.recommender, weather);

    // Background reading generation through the transport
    if config.generator.enabled {
        let (bus, _dispatcher) = transport::spawn(64, Arc::new(analysis.clone()));
        let seed_reading = analysis.last_stored_reading().await;
        let _generator = generator::spawn(config.generator.clone(), seed_reading, bus);
    }

    // Create application state
    let state = AppState {
        config: Arc::new(config.clone()),
        analysis,
        crop,
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Soil Health Monitoring Platform API v1.0"
}

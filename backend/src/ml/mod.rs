//! Pre-trained model loading and inference

pub mod forest;
pub mod outlier;

pub use forest::{CropModel, ModelMetrics};
pub use outlier::FittedOutlierDetector;

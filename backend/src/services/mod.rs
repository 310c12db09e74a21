//! Business logic services for the Soil Health Monitoring Platform

pub mod analysis;
pub mod crop;

pub use analysis::AnalysisService;
pub use crop::CropService;

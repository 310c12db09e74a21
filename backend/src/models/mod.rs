//! Domain models for the Soil Health Monitoring Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;

//! HTTP handlers for the Soil Health Monitoring Platform

pub mod analysis;
pub mod crop;
pub mod health;

pub use analysis::*;
pub use crop::*;
pub use health::*;

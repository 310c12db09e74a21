//! Shared types and scoring core for the Soil Health Monitoring Platform
//!
//! This crate contains the domain models, agronomic reference ranges and the
//! pure scoring functions shared between the backend and any future
//! components of the system.

pub mod models;
pub mod ranges;
pub mod scoring;
pub mod types;
pub mod validation;

pub use models::*;
pub use ranges::*;
pub use scoring::*;
pub use types::*;
pub use validation::*;

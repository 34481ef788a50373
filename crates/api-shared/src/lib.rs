//! # API Shared
//!
//! Shared definitions for the temporal analysis APIs.
//!
//! Contains:
//! - Form and response types for the HTTP surface (`types` module), with OpenAPI schemas
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` for common functionality.

pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;

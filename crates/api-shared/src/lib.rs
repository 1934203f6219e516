//! # API Shared
//!
//! Shared definitions for the letterpdf HTTP API.
//!
//! Contains:
//! - Request/response bodies with OpenAPI schemas (`dto` module)
//! - The `HealthService`
//! - Access-password validation
//!
//! Used by `api-rest`; nothing here depends on a particular HTTP framework.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;

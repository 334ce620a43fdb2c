//! Service layer for the elo-ranker service
//!
//! This module contains the application state that wires the ranking store to
//! its configuration, plus the health reporting used by the HTTP surface.

pub mod app;
pub mod health;

pub use app::{AppState, ServiceError};
pub use health::{HealthCheck, HealthStatus};

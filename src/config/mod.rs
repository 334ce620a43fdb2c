//! Configuration management for the elo-ranker service
//!
//! This module handles configuration loading from TOML files and environment
//! variables, validation, and default values for the ranking service.

pub mod app;
pub mod rating;
pub mod storage;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, ServiceSettings};
pub use rating::RatingSettings;
pub use storage::{StorageBackend, StorageSettings};

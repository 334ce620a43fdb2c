//! Utility functions for the ranking service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new random unique ID
pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// A player id must contain at least one non-whitespace character
pub fn is_valid_player_id(id: &str) -> bool {
    !id.trim().is_empty()
}

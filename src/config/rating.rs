//! Rating system configuration

use crate::rating::{DEFAULT_INITIAL_RATING, K_FACTOR};
use crate::types::Rating;
use serde::{Deserialize, Serialize};

/// Elo parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    /// Development coefficient applied to every update
    pub k_factor: f64,
    /// Rating of the first registered player
    pub default_rating: Rating,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            k_factor: K_FACTOR,
            default_rating: DEFAULT_INITIAL_RATING,
        }
    }
}

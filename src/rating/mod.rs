//! Elo rating engine
//!
//! This module provides the rating calculator interface and the Elo
//! implementation backed by the skillratings crate.

pub mod calculator;
pub mod elo;

// Re-export commonly used types
pub use calculator::{MockRatingCalculator, RatingCalculator};
pub use elo::{
    expected_score, initial_rating, match_scores, new_rating, EloCalculator,
    DEFAULT_INITIAL_RATING, K_FACTOR,
};

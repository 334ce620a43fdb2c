//! Rating calculator trait and test double
//!
//! This module defines the interface the ranking store uses for all rating
//! arithmetic.

use crate::types::Rating;

/// Trait for the pure rating arithmetic used by the ranking store
pub trait RatingCalculator: Send + Sync {
    /// Probability in `(0, 1)` that a player rated `rating_a` beats `rating_b`
    fn expected_score(&self, rating_a: Rating, rating_b: Rating) -> f64;

    /// Rating after a match given the expected and actual score
    fn new_rating(&self, current: Rating, expected: f64, actual: f64) -> Rating;

    /// Rating assigned to a new entrant given the current field
    fn initial_rating(&self, existing: &[Rating]) -> Rating;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

/// Calculator that records every call and delegates to a fixed-K Elo
/// formula (for testing)
#[derive(Debug)]
pub struct MockRatingCalculator {
    inner: crate::rating::elo::EloCalculator,
    expected_calls: std::sync::Mutex<Vec<(Rating, Rating)>>,
    update_calls: std::sync::Mutex<Vec<(Rating, f64, f64)>>,
}

impl MockRatingCalculator {
    pub fn new() -> Self {
        Self {
            inner: crate::rating::elo::EloCalculator::default(),
            expected_calls: std::sync::Mutex::new(Vec::new()),
            update_calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Arguments of every `expected_score` call, in order
    pub fn expected_calls(&self) -> Vec<(Rating, Rating)> {
        self.expected_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Arguments of every `new_rating` call, in order
    pub fn update_calls(&self) -> Vec<(Rating, f64, f64)> {
        self.update_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Clear recorded calls
    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.expected_calls.lock() {
            calls.clear();
        }
        if let Ok(mut calls) = self.update_calls.lock() {
            calls.clear();
        }
    }
}

impl Default for MockRatingCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl RatingCalculator for MockRatingCalculator {
    fn expected_score(&self, rating_a: Rating, rating_b: Rating) -> f64 {
        if let Ok(mut calls) = self.expected_calls.lock() {
            calls.push((rating_a, rating_b));
        }
        self.inner.expected_score(rating_a, rating_b)
    }

    fn new_rating(&self, current: Rating, expected: f64, actual: f64) -> Rating {
        if let Ok(mut calls) = self.update_calls.lock() {
            calls.push((current, expected, actual));
        }
        self.inner.new_rating(current, expected, actual)
    }

    fn initial_rating(&self, existing: &[Rating]) -> Rating {
        self.inner.initial_rating(existing)
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({ "type": "mock" })
    }
}

//! Elo rating system implementation
//!
//! Expected scores come from the skillratings Elo module; rating updates are
//! rounded to whole points after every match.

use crate::config::RatingSettings;
use crate::rating::calculator::RatingCalculator;
use crate::types::Rating;
use skillratings::elo::EloRating;

/// Development coefficient applied to every rating update
pub const K_FACTOR: f64 = 32.0;

/// Rating given to the very first registered player
pub const DEFAULT_INITIAL_RATING: Rating = 1200;

/// Probability that a player rated `rating_a` beats one rated `rating_b`.
///
/// `1 / (1 + 10^((rating_b - rating_a) / 400))`, always in `(0, 1)`, and
/// `expected_score(a, b) + expected_score(b, a) == 1`.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    let (expected_a, _) = skillratings::elo::expected_score(
        &EloRating { rating: rating_a },
        &EloRating { rating: rating_b },
    );
    expected_a
}

/// Rating after a match with the standard K factor.
///
/// `round(current + K * (actual - expected))`, where `actual` is 1 for a win,
/// 0.5 for a draw and 0 for a loss.
pub fn new_rating(current: Rating, expected: f64, actual: f64) -> Rating {
    apply_update(current, expected, actual, K_FACTOR)
}

/// Rating for a new entrant: the rounded mean of the current field, or
/// [`DEFAULT_INITIAL_RATING`] when nobody is registered yet.
pub fn initial_rating(existing: &[Rating]) -> Rating {
    mean_or_default(existing, DEFAULT_INITIAL_RATING)
}

/// Actual scores `(winner, loser)` for a reported result
pub fn match_scores(is_draw: bool) -> (f64, f64) {
    if is_draw {
        (0.5, 0.5)
    } else {
        (1.0, 0.0)
    }
}

fn apply_update(current: Rating, expected: f64, actual: f64, k_factor: f64) -> Rating {
    (current as f64 + k_factor * (actual - expected)).round() as Rating
}

fn mean_or_default(existing: &[Rating], default: Rating) -> Rating {
    if existing.is_empty() {
        return default;
    }
    let total: i64 = existing.iter().map(|&r| r as i64).sum();
    (total as f64 / existing.len() as f64).round() as Rating
}

/// Elo calculator with a configurable K factor and starting rating
#[derive(Debug, Clone, PartialEq)]
pub struct EloCalculator {
    k_factor: f64,
    default_rating: Rating,
}

impl EloCalculator {
    pub fn new(k_factor: f64, default_rating: Rating) -> Self {
        Self {
            k_factor,
            default_rating,
        }
    }

    pub fn from_settings(settings: &RatingSettings) -> Self {
        Self::new(settings.k_factor, settings.default_rating)
    }

    /// K factor used for rating updates
    pub fn k_factor(&self) -> f64 {
        self.k_factor
    }

    /// Rating assigned when the field is empty
    pub fn default_rating(&self) -> Rating {
        self.default_rating
    }
}

impl Default for EloCalculator {
    fn default() -> Self {
        Self::new(K_FACTOR, DEFAULT_INITIAL_RATING)
    }
}

impl RatingCalculator for EloCalculator {
    fn expected_score(&self, rating_a: Rating, rating_b: Rating) -> f64 {
        expected_score(rating_a as f64, rating_b as f64)
    }

    fn new_rating(&self, current: Rating, expected: f64, actual: f64) -> Rating {
        apply_update(current, expected, actual, self.k_factor)
    }

    fn initial_rating(&self, existing: &[Rating]) -> Rating {
        mean_or_default(existing, self.default_rating)
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "elo",
            "k_factor": self.k_factor,
            "default_rating": self.default_rating
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_expected_score_equal_ratings() {
        assert!((expected_score(1200.0, 1200.0) - 0.5).abs() < EPSILON);
        assert!((expected_score(2400.0, 2400.0) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_expected_score_favours_higher_rating() {
        let favourite = expected_score(1400.0, 1000.0);
        assert!(favourite > 0.9 && favourite < 1.0);
        // 400 points apart is 10:1 odds
        assert!((favourite - 10.0 / 11.0).abs() < EPSILON);
    }

    #[test]
    fn test_new_rating_known_values() {
        assert_eq!(new_rating(1200, 0.5, 0.5), 1200);
        assert_eq!(new_rating(1200, 0.24, 1.0), 1224);
        assert_eq!(new_rating(1200, 0.24, 0.0), 1192);
        assert_eq!(new_rating(1200, 0.5, 1.0), 1216);
        assert_eq!(new_rating(1200, 0.5, 0.0), 1184);
    }

    #[test]
    fn test_initial_rating() {
        assert_eq!(initial_rating(&[]), 1200);
        assert_eq!(initial_rating(&[1000, 1100]), 1050);
        assert_eq!(initial_rating(&[1216, 1184, 1201]), 1200);
        // 1000.5 rounds away from zero
        assert_eq!(initial_rating(&[1000, 1001]), 1001);
    }

    #[test]
    fn test_match_scores() {
        assert_eq!(match_scores(false), (1.0, 0.0));
        assert_eq!(match_scores(true), (0.5, 0.5));
    }

    #[test]
    fn test_calculator_defaults() {
        let calculator = EloCalculator::default();
        assert_eq!(calculator.k_factor(), 32.0);
        assert_eq!(calculator.default_rating(), 1200);
        assert_eq!(calculator.initial_rating(&[]), 1200);
        assert_eq!(calculator.config()["type"], "elo");
    }

    #[test]
    fn test_calculator_custom_k_factor() {
        let calculator = EloCalculator::new(16.0, 1500);
        assert_eq!(calculator.new_rating(1500, 0.5, 1.0), 1508);
        assert_eq!(calculator.initial_rating(&[]), 1500);
    }

    #[test]
    fn test_calculator_matches_free_functions() {
        let calculator = EloCalculator::default();
        let expected = calculator.expected_score(1300, 1100);
        assert!((expected - expected_score(1300.0, 1100.0)).abs() < EPSILON);
        assert_eq!(
            calculator.new_rating(1300, expected, 0.0),
            new_rating(1300, expected, 0.0)
        );
    }

    proptest! {
        #[test]
        fn prop_expected_scores_are_complementary(a in 0.0f64..4000.0, b in 0.0f64..4000.0) {
            let sum = expected_score(a, b) + expected_score(b, a);
            prop_assert!((sum - 1.0).abs() < EPSILON);
        }

        #[test]
        fn prop_expected_score_in_open_interval(a in 0.0f64..3000.0, b in 0.0f64..3000.0) {
            let score = expected_score(a, b);
            prop_assert!(score > 0.0 && score < 1.0);
        }

        #[test]
        fn prop_perfectly_expected_draw_is_noop(r in 100i32..3000) {
            let expected = expected_score(r as f64, r as f64);
            prop_assert_eq!(new_rating(r, expected, 0.5), r);
        }
    }
}

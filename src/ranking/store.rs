//! Ranking store: player registration, match processing and match history
//!
//! All mutations go through one mutex per store so that id uniqueness holds
//! and both expected scores of a match are computed from pre-match ratings.
//! Ranking events are published while that mutex is held, which keeps the
//! event order identical to the order in which ratings changed.

use crate::error::{RankerError, Result};
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::ranking::broadcaster::Broadcaster;
use crate::ranking::repository::PlayerRepository;
use crate::rating::{match_scores, RatingCalculator};
use crate::types::{MatchOutcome, MatchRecord, Player, Rating};
use crate::utils::{current_timestamp, is_valid_player_id};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};

/// Current player set, match log and live update fan-out
pub struct RankingStore {
    repository: Arc<dyn PlayerRepository>,
    calculator: Arc<dyn RatingCalculator>,
    broadcaster: Arc<Broadcaster>,
    matches: RwLock<Vec<MatchRecord>>,
    write_lock: Mutex<()>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RankingStore {
    pub fn new(
        repository: Arc<dyn PlayerRepository>,
        calculator: Arc<dyn RatingCalculator>,
        broadcaster: Arc<Broadcaster>,
    ) -> Self {
        Self {
            repository,
            calculator,
            broadcaster,
            matches: RwLock::new(Vec::new()),
            write_lock: Mutex::new(()),
            metrics: None,
        }
    }

    /// Record registrations, matches and rejections in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn broadcaster(&self) -> Arc<Broadcaster> {
        self.broadcaster.clone()
    }

    /// Register a new player rated at the mean of the current field
    pub fn create_player(&self, id: &str) -> Result<Player> {
        let timer = MetricsTimer::start();

        let result = self.create_player_locked(id);
        match &result {
            Ok(player) => {
                info!(
                    "Player '{}' registered with rating {}",
                    player.id, player.rating
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_player_created(player.rating, timer.stop());
                }
            }
            Err(e) => self.record_rejection("create_player", e),
        }
        result
    }

    fn create_player_locked(&self, id: &str) -> Result<Player> {
        if !is_valid_player_id(id) {
            return Err(RankerError::InvalidInput {
                reason: "player id must not be empty".to_string(),
            });
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RankerError::lock_poisoned("ranking write"))?;

        if self.repository.find_by_id(id)?.is_some() {
            return Err(RankerError::DuplicatePlayer {
                player_id: id.to_string(),
            });
        }

        let existing: Vec<Rating> = self
            .repository
            .list_all()?
            .into_iter()
            .map(|player| player.rating)
            .collect();
        let player = Player::new(id, self.calculator.initial_rating(&existing));

        self.repository.save(player.clone())?;
        Ok(player)
    }

    pub fn get_player(&self, id: &str) -> Result<Option<Player>> {
        self.repository.find_by_id(id)
    }

    /// All players by rating, highest first. Equal ratings keep
    /// registration order.
    pub fn list_players(&self) -> Result<Vec<Player>> {
        let mut players = self.repository.list_all()?;
        players.sort_by(|a, b| b.rating.cmp(&a.rating));
        Ok(players)
    }

    /// Apply a match result to both players.
    ///
    /// With `is_draw` the winner/loser labels are only positional: both sides
    /// score 0.5. Either both players are updated and the match is logged, or
    /// nothing changes.
    pub fn process_match(
        &self,
        winner_id: &str,
        loser_id: &str,
        is_draw: bool,
    ) -> Result<MatchOutcome> {
        let timer = MetricsTimer::start();

        let result = self.process_match_locked(winner_id, loser_id, is_draw);
        match &result {
            Ok(outcome) => {
                info!(
                    "Match processed - winner: '{}' -> {}, loser: '{}' -> {}, draw: {}",
                    outcome.winner.id,
                    outcome.winner.rating,
                    outcome.loser.id,
                    outcome.loser.rating,
                    is_draw
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_match_processed(
                        is_draw,
                        [outcome.winner.rating, outcome.loser.rating],
                        timer.stop(),
                    );
                    metrics.record_events_emitted(2);
                }
            }
            Err(e) => self.record_rejection("process_match", e),
        }
        result
    }

    fn process_match_locked(
        &self,
        winner_id: &str,
        loser_id: &str,
        is_draw: bool,
    ) -> Result<MatchOutcome> {
        if winner_id.is_empty() || loser_id.is_empty() {
            return Err(RankerError::InvalidInput {
                reason: "winner and loser ids must not be empty".to_string(),
            });
        }

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RankerError::lock_poisoned("ranking write"))?;

        let winner = self
            .repository
            .find_by_id(winner_id)?
            .ok_or_else(|| RankerError::PlayerNotFound {
                player_id: winner_id.to_string(),
            })?;
        let loser = self
            .repository
            .find_by_id(loser_id)?
            .ok_or_else(|| RankerError::PlayerNotFound {
                player_id: loser_id.to_string(),
            })?;

        // Only checked once both players are known to exist
        if winner.id == loser.id {
            return Err(RankerError::InvalidInput {
                reason: format!("player '{}' cannot play against themself", winner.id),
            });
        }

        let (winner_score, loser_score) = match_scores(is_draw);

        // Both expectations from pre-match ratings
        let winner_expected = self.calculator.expected_score(winner.rating, loser.rating);
        let loser_expected = self.calculator.expected_score(loser.rating, winner.rating);

        let updated_winner = Player::new(
            winner.id,
            self.calculator
                .new_rating(winner.rating, winner_expected, winner_score),
        );
        let updated_loser = Player::new(
            loser.id,
            self.calculator
                .new_rating(loser.rating, loser_expected, loser_score),
        );

        self.repository
            .save_all(vec![updated_winner.clone(), updated_loser.clone()])?;

        self.matches
            .write()
            .map_err(|_| RankerError::lock_poisoned("match log write"))?
            .push(MatchRecord {
                winner_id: updated_winner.id.clone(),
                loser_id: updated_loser.id.clone(),
                is_draw,
                timestamp: current_timestamp(),
            });

        self.broadcaster.publish(&updated_winner);
        self.broadcaster.publish(&updated_loser);

        Ok(MatchOutcome {
            winner: updated_winner,
            loser: updated_loser,
        })
    }

    /// Copy of the match log, oldest first
    pub fn match_history(&self) -> Result<Vec<MatchRecord>> {
        let matches = self
            .matches
            .read()
            .map_err(|_| RankerError::lock_poisoned("match log read"))?;
        Ok(matches.clone())
    }

    pub fn match_count(&self) -> Result<usize> {
        let matches = self
            .matches
            .read()
            .map_err(|_| RankerError::lock_poisoned("match log read"))?;
        Ok(matches.len())
    }

    pub fn player_count(&self) -> Result<usize> {
        self.repository.count()
    }

    fn record_rejection(&self, operation: &str, error: &RankerError) {
        match error {
            RankerError::Storage { .. } | RankerError::Internal { .. } => {
                warn!("{} failed: {}", operation, error)
            }
            _ => debug!("{} rejected: {}", operation, error),
        }
        if let Some(metrics) = &self.metrics {
            metrics.record_rejection(error.kind());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::repository::{InMemoryPlayerRepository, MockPlayerRepository};
    use crate::rating::{EloCalculator, MockRatingCalculator};

    fn create_test_store() -> RankingStore {
        RankingStore::new(
            Arc::new(InMemoryPlayerRepository::new()),
            Arc::new(EloCalculator::default()),
            Broadcaster::new(),
        )
    }

    #[test]
    fn test_first_player_gets_default_rating() {
        let store = create_test_store();
        let alice = store.create_player("alice").unwrap();
        assert_eq!(alice, Player::new("alice", 1200));
        assert_eq!(store.player_count().unwrap(), 1);
    }

    #[test]
    fn test_new_player_gets_mean_rating() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();
        store.process_match("alice", "bob", false).unwrap();
        store.process_match("alice", "bob", false).unwrap();

        let ratings: Vec<Rating> = store
            .list_players()
            .unwrap()
            .iter()
            .map(|p| p.rating)
            .collect();
        let mean = (ratings.iter().sum::<Rating>() as f64 / ratings.len() as f64).round();

        let carol = store.create_player("carol").unwrap();
        assert_eq!(carol.rating, mean as Rating);
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();
        store.process_match("alice", "bob", false).unwrap();

        let err = store.create_player("alice").unwrap_err();
        assert_eq!(
            err,
            RankerError::DuplicatePlayer {
                player_id: "alice".to_string()
            }
        );
        assert_eq!(store.player_count().unwrap(), 2);
    }

    #[test]
    fn test_blank_player_id_rejected() {
        let store = create_test_store();
        assert!(matches!(
            store.create_player("   "),
            Err(RankerError::InvalidInput { .. })
        ));
        assert_eq!(store.player_count().unwrap(), 0);
    }

    #[test]
    fn test_alice_beats_bob() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();

        let outcome = store.process_match("alice", "bob", false).unwrap();
        assert_eq!(outcome.winner, Player::new("alice", 1216));
        assert_eq!(outcome.loser, Player::new("bob", 1184));

        assert_eq!(
            store.list_players().unwrap(),
            vec![Player::new("alice", 1216), Player::new("bob", 1184)]
        );
        assert_eq!(store.get_player("bob").unwrap().unwrap().rating, 1184);
    }

    #[test]
    fn test_draw_between_equals_changes_nothing() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();

        let outcome = store.process_match("bob", "alice", true).unwrap();
        assert_eq!(outcome.winner, Player::new("bob", 1200));
        assert_eq!(outcome.loser, Player::new("alice", 1200));

        let history = store.match_history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_draw);
        assert_eq!(history[0].winner_id, "bob");
    }

    #[test]
    fn test_draw_moves_ratings_towards_each_other() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();
        store.process_match("alice", "bob", false).unwrap();

        // alice 1216, bob 1184; the underdog gains on a draw
        let outcome = store.process_match("alice", "bob", true).unwrap();
        assert!(outcome.winner.rating < 1216);
        assert!(outcome.loser.rating > 1184);
    }

    #[test]
    fn test_unknown_player_is_atomic() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        let mut subscription = store.broadcaster().subscribe();

        let err = store.process_match("alice", "ghost", false).unwrap_err();
        assert_eq!(
            err,
            RankerError::PlayerNotFound {
                player_id: "ghost".to_string()
            }
        );

        let err = store.process_match("ghost", "alice", false).unwrap_err();
        assert!(matches!(err, RankerError::PlayerNotFound { .. }));

        assert_eq!(store.get_player("alice").unwrap().unwrap().rating, 1200);
        assert_eq!(store.match_count().unwrap(), 0);
        assert!(subscription.try_recv().is_none());
    }

    #[test]
    fn test_missing_player_reported_before_self_match() {
        let store = create_test_store();
        store.create_player("alice").unwrap();

        assert_eq!(
            store.process_match("ghost", "ghost", false).unwrap_err(),
            RankerError::PlayerNotFound {
                player_id: "ghost".to_string()
            }
        );
        assert_eq!(
            store.process_match("  ", "alice", false).unwrap_err(),
            RankerError::PlayerNotFound {
                player_id: "  ".to_string()
            }
        );
        assert!(matches!(
            store.process_match("", "alice", false),
            Err(RankerError::InvalidInput { .. })
        ));
        assert_eq!(store.match_count().unwrap(), 0);
    }

    #[test]
    fn test_self_match_rejected() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        let mut subscription = store.broadcaster().subscribe();

        assert!(matches!(
            store.process_match("alice", "alice", false),
            Err(RankerError::InvalidInput { .. })
        ));
        assert_eq!(store.get_player("alice").unwrap().unwrap().rating, 1200);
        assert_eq!(store.match_count().unwrap(), 0);
        assert!(subscription.try_recv().is_none());
    }

    #[test]
    fn test_concurrent_registration_of_same_id() {
        let store = Arc::new(create_test_store());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.create_player("same"))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, RankerError::DuplicatePlayer { .. })));
        assert_eq!(store.player_count().unwrap(), 1);
    }

    #[test]
    fn test_expectations_use_pre_match_ratings() {
        let calculator = Arc::new(MockRatingCalculator::new());
        let store = RankingStore::new(
            Arc::new(InMemoryPlayerRepository::new()),
            calculator.clone(),
            Broadcaster::new(),
        );
        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();
        store.process_match("alice", "bob", false).unwrap();
        calculator.clear_calls();

        store.process_match("bob", "alice", false).unwrap();

        assert_eq!(calculator.expected_calls(), vec![(1184, 1216), (1216, 1184)]);
        let updates = calculator.update_calls();
        assert_eq!(updates[0].0, 1184);
        assert_eq!(updates[0].2, 1.0);
        assert_eq!(updates[1].0, 1216);
        assert_eq!(updates[1].2, 0.0);
    }

    #[test]
    fn test_events_published_winner_first() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();
        let mut subscription = store.broadcaster().subscribe();

        store.process_match("bob", "alice", false).unwrap();

        let first = subscription.try_recv().unwrap();
        let second = subscription.try_recv().unwrap();
        assert_eq!(first, Player::new("bob", 1216));
        assert_eq!(second, Player::new("alice", 1184));
        assert!(subscription.try_recv().is_none());
    }

    #[test]
    fn test_repeated_wins_have_diminishing_returns() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();

        let mut previous = (1200, 1200);
        let mut previous_gain = Rating::MAX;
        for _ in 0..20 {
            let outcome = store.process_match("alice", "bob", false).unwrap();
            let gain = outcome.winner.rating - previous.0;

            assert!(outcome.winner.rating > previous.0);
            assert!(outcome.loser.rating < previous.1);
            assert!(gain <= previous_gain);

            previous_gain = gain;
            previous = (outcome.winner.rating, outcome.loser.rating);
        }
        assert!(previous_gain < 16);
        assert_eq!(store.match_count().unwrap(), 20);
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let store = create_test_store();
        for id in ["carol", "alice", "bob"] {
            store.create_player(id).unwrap();
        }

        let ids: Vec<_> = store
            .list_players()
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn test_match_history_is_a_copy() {
        let store = create_test_store();
        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();
        store.process_match("alice", "bob", false).unwrap();

        let mut history = store.match_history().unwrap();
        history.clear();

        assert_eq!(store.match_history().unwrap().len(), 1);
        assert_eq!(store.match_count().unwrap(), 1);
    }

    #[test]
    fn test_storage_failure_leaves_no_trace() {
        let mut repository = MockPlayerRepository::new();
        repository
            .expect_find_by_id()
            .returning(|id| Ok(Some(Player::new(id, 1200))));
        repository.expect_save_all().times(1).returning(|_| {
            Err(RankerError::Storage {
                message: "disk full".to_string(),
            })
        });

        let store = RankingStore::new(
            Arc::new(repository),
            Arc::new(EloCalculator::default()),
            Broadcaster::new(),
        );
        let mut subscription = store.broadcaster().subscribe();

        let err = store.process_match("alice", "bob", false).unwrap_err();
        assert!(matches!(err, RankerError::Storage { .. }));
        assert_eq!(store.match_count().unwrap(), 0);
        assert!(subscription.try_recv().is_none());
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = Arc::new(MetricsCollector::new().unwrap());
        let store = create_test_store().with_metrics(metrics.clone());

        store.create_player("alice").unwrap();
        store.create_player("bob").unwrap();
        store.create_player("alice").unwrap_err();
        store.process_match("alice", "bob", true).unwrap();

        assert_eq!(metrics.ranking().players_created_total.get(), 2);
        assert_eq!(
            metrics
                .ranking()
                .matches_processed_total
                .with_label_values(&["draw"])
                .get(),
            1
        );
        assert_eq!(
            metrics
                .service()
                .requests_rejected_total
                .with_label_values(&["duplicate_player"])
                .get(),
            1
        );
        assert_eq!(metrics.stream().events_emitted_total.get(), 2);
        assert_eq!(
            metrics
                .performance()
                .player_creation_duration
                .get_sample_count(),
            2
        );
        assert_eq!(
            metrics
                .performance()
                .match_processing_duration
                .get_sample_count(),
            1
        );
    }
}

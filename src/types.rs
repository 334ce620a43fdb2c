//! Common types used throughout the ranking service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Elo rating, always stored as a rounded integer
pub type Rating = i32;

/// Unique identifier for live ranking subscribers
pub type SubscriberId = Uuid;

/// A ranked player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub rating: Rating,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, rating: Rating) -> Self {
        Self {
            id: id.into(),
            rating,
        }
    }
}

/// Archived result of a processed match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    /// Winner id (first player when the match is a draw)
    pub winner_id: PlayerId,
    /// Loser id (second player when the match is a draw)
    pub loser_id: PlayerId,
    pub is_draw: bool,
    pub timestamp: DateTime<Utc>,
}

/// Both players after a match has been applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner: Player,
    pub loser: Player,
}

/// Event pushed to live ranking subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RankingEvent {
    RankingUpdate { player: Player },
}

impl From<Player> for RankingEvent {
    fn from(player: Player) -> Self {
        RankingEvent::RankingUpdate { player }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_event_wire_format() {
        let event = RankingEvent::from(Player::new("alice", 1216));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "RankingUpdate",
                "player": { "id": "alice", "rating": 1216 }
            })
        );
    }

    #[test]
    fn test_match_record_uses_camel_case() {
        let record = MatchRecord {
            winner_id: "alice".to_string(),
            loser_id: "bob".to_string(),
            is_draw: false,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["winnerId"], "alice");
        assert_eq!(json["loserId"], "bob");
        assert_eq!(json["isDraw"], false);
        assert!(json["timestamp"].is_string());
    }
}

//! Ranking store, player persistence and live update broadcasting
//!
//! The store owns the match log and applies rating engine output. Players are
//! persisted through a repository, and the broadcaster fans rating changes out
//! to connected clients.

pub mod broadcaster;
pub mod repository;
pub mod store;

// Re-export commonly used types
pub use broadcaster::{Broadcaster, Subscription};
pub use repository::{InMemoryPlayerRepository, JsonFilePlayerRepository, PlayerRepository};
pub use store::RankingStore;

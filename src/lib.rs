//! Elo Ranker - rating service for head-to-head matches
//!
//! This crate registers players, applies the Elo rating system to reported
//! match results and streams rating changes to live subscribers over
//! server-sent events.

pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod ranking;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RankerError, Result};
pub use types::*;

// Re-export key components
pub use ranking::{Broadcaster, PlayerRepository, RankingStore, Subscription};
pub use rating::{EloCalculator, RatingCalculator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

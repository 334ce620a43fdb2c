//! Error types for the ranking service
//!
//! Core operations return [`RankerError`] so the HTTP layer can map each
//! category to a status code. Startup and configuration code uses anyhow.

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RankerError>;

/// Categorical failures surfaced by the ranking core
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankerError {
    #[error("Player already exists: {player_id}")]
    DuplicatePlayer { player_id: String },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Internal service error: {message}")]
    Internal { message: String },
}

impl RankerError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            RankerError::DuplicatePlayer { .. } => "duplicate_player",
            RankerError::PlayerNotFound { .. } => "player_not_found",
            RankerError::InvalidInput { .. } => "invalid_input",
            RankerError::Storage { .. } => "storage",
            RankerError::Internal { .. } => "internal",
        }
    }

    pub(crate) fn lock_poisoned(what: &str) -> Self {
        RankerError::Internal {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}

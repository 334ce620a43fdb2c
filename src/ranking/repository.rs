//! Player persistence interface and implementations
//!
//! The ranking store only needs four things from persistence: look a player
//! up, save one or more players, list everyone and count them. Both
//! implementations keep players in registration order so that equal ratings
//! rank in a stable order.

use crate::error::{RankerError, Result};
use crate::types::{Player, PlayerId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, error, info};

/// Trait for player storage operations
#[cfg_attr(test, mockall::automock)]
pub trait PlayerRepository: Send + Sync {
    /// Get a player by id
    fn find_by_id(&self, id: &str) -> Result<Option<Player>>;

    /// Insert a new player or replace an existing one
    fn save(&self, player: Player) -> Result<()>;

    /// Store several players atomically: either all are written or none
    fn save_all(&self, players: Vec<Player>) -> Result<()>;

    /// All players in registration order
    fn list_all(&self) -> Result<Vec<Player>>;

    /// Number of registered players
    fn count(&self) -> Result<usize>;
}

/// Insertion-ordered player table shared by the repository implementations
#[derive(Debug, Clone, Default)]
struct PlayerTable {
    players: Vec<Player>,
    index: HashMap<PlayerId, usize>,
}

impl PlayerTable {
    fn from_players(players: Vec<Player>) -> Result<Self> {
        let mut table = Self::default();
        for player in players {
            if table.index.contains_key(&player.id) {
                return Err(RankerError::Storage {
                    message: format!("Duplicate player '{}' in stored data", player.id),
                });
            }
            table.upsert(player);
        }
        Ok(table)
    }

    fn get(&self, id: &str) -> Option<&Player> {
        self.index.get(id).map(|&slot| &self.players[slot])
    }

    fn upsert(&mut self, player: Player) {
        match self.index.get(&player.id) {
            Some(&slot) => self.players[slot] = player,
            None => {
                self.index.insert(player.id.clone(), self.players.len());
                self.players.push(player);
            }
        }
    }
}

/// In-memory player repository
#[derive(Debug, Default)]
pub struct InMemoryPlayerRepository {
    table: RwLock<PlayerTable>,
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerRepository for InMemoryPlayerRepository {
    fn find_by_id(&self, id: &str) -> Result<Option<Player>> {
        let table = self
            .table
            .read()
            .map_err(|_| RankerError::lock_poisoned("players read"))?;

        Ok(table.get(id).cloned())
    }

    fn save(&self, player: Player) -> Result<()> {
        self.save_all(vec![player])
    }

    fn save_all(&self, players: Vec<Player>) -> Result<()> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RankerError::lock_poisoned("players write"))?;

        for player in players {
            table.upsert(player);
        }

        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Player>> {
        let table = self
            .table
            .read()
            .map_err(|_| RankerError::lock_poisoned("players read"))?;

        Ok(table.players.clone())
    }

    fn count(&self) -> Result<usize> {
        let table = self
            .table
            .read()
            .map_err(|_| RankerError::lock_poisoned("players read"))?;

        Ok(table.players.len())
    }
}

/// Player repository mirrored to a JSON file after every write
///
/// Writes go to a sibling temporary file which is then renamed over the data
/// file, so a crash never leaves a half-written ranking behind. A failed
/// write leaves the in-memory table unchanged.
#[derive(Debug)]
pub struct JsonFilePlayerRepository {
    path: PathBuf,
    table: RwLock<PlayerTable>,
}

impl JsonFilePlayerRepository {
    /// Open the data file, loading existing players if it exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let table = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| RankerError::Storage {
                message: format!("Failed to read {}: {}", path.display(), e),
            })?;
            let players: Vec<Player> =
                serde_json::from_str(&contents).map_err(|e| RankerError::Storage {
                    message: format!("Failed to parse {}: {}", path.display(), e),
                })?;
            info!(
                "Loaded {} players from {}",
                players.len(),
                path.display()
            );
            PlayerTable::from_players(players)?
        } else {
            info!("No data file at {}, starting empty", path.display());
            PlayerTable::default()
        };

        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    /// Location of the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, table: &PlayerTable) -> Result<()> {
        let payload =
            serde_json::to_vec_pretty(&table.players).map_err(|e| RankerError::Storage {
                message: format!("Failed to serialize players: {}", e),
            })?;

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        std::fs::write(&tmp_path, payload)
            .and_then(|_| std::fs::rename(&tmp_path, &self.path))
            .map_err(|e| {
                error!("Failed to write {}: {}", self.path.display(), e);
                RankerError::Storage {
                    message: format!("Failed to write {}: {}", self.path.display(), e),
                }
            })?;

        debug!(
            "Persisted {} players to {}",
            table.players.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl PlayerRepository for JsonFilePlayerRepository {
    fn find_by_id(&self, id: &str) -> Result<Option<Player>> {
        let table = self
            .table
            .read()
            .map_err(|_| RankerError::lock_poisoned("players read"))?;

        Ok(table.get(id).cloned())
    }

    fn save(&self, player: Player) -> Result<()> {
        self.save_all(vec![player])
    }

    fn save_all(&self, players: Vec<Player>) -> Result<()> {
        let mut table = self
            .table
            .write()
            .map_err(|_| RankerError::lock_poisoned("players write"))?;

        let mut staged = table.clone();
        for player in players {
            staged.upsert(player);
        }

        self.persist(&staged)?;
        *table = staged;
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Player>> {
        let table = self
            .table
            .read()
            .map_err(|_| RankerError::lock_poisoned("players read"))?;

        Ok(table.players.clone())
    }

    fn count(&self) -> Result<usize> {
        let table = self
            .table
            .read()
            .map_err(|_| RankerError::lock_poisoned("players read"))?;

        Ok(table.players.len())
    }
}

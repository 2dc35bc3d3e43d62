//! Filesystem record store.
//!
//! Handles reading the player data written by the sync collaborators:
//! - Normalized JSONL files (`players.jsonl`, `characters.jsonl`)
//! - The derived statistics snapshot

pub mod jsonl;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Character, Player, PlayerId};

pub use jsonl::{EntityType, JsonlReader, JsonlWriter};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Invalid record at {path}:{line}: {message}")]
    InvalidRecord {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn normalized_dir(&self) -> PathBuf {
        self.data_dir.join("normalized")
    }

    pub fn derived_dir(&self) -> PathBuf {
        self.data_dir.join("derived")
    }

    /// Where the last computed snapshot is persisted.
    pub fn snapshot_path(&self) -> PathBuf {
        self.derived_dir().join("snapshot.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Read access to the current player and character records.
///
/// Every call returns the store's contents at that moment; nothing is cached.
pub trait RecordSource: Send + Sync {
    fn players(&self) -> Result<Vec<Player>, StorageError>;

    fn characters(&self) -> Result<Vec<Character>, StorageError>;
}

/// Collapse duplicate player IDs.
///
/// The last record for an ID wins and takes the slot of the first occurrence.
pub fn dedup_by_id(players: Vec<Player>) -> Vec<Player> {
    let mut slots: HashMap<PlayerId, usize> = HashMap::new();
    let mut out: Vec<Player> = Vec::with_capacity(players.len());

    for player in players {
        match slots.get(&player.id) {
            Some(&idx) => {
                warn!("Duplicate player record {}, keeping the latest", player.id);
                out[idx] = player;
            }
            None => {
                slots.insert(player.id.clone(), out.len());
                out.push(player);
            }
        }
    }

    out
}

/// Record store backed by the normalized JSONL files.
pub struct JsonlRecordStore {
    config: StorageConfig,
}

impl JsonlRecordStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Replace the stored records with the given players and characters.
    pub fn import(&self, players: &[Player], characters: &[Character]) -> Result<(usize, usize), StorageError> {
        let players = dedup_by_id(players.to_vec());
        let p = JsonlWriter::for_entity(&self.config, EntityType::Player).write_all(&players)?;
        let c = JsonlWriter::for_entity(&self.config, EntityType::Character).write_all(characters)?;
        info!("Imported {} players and {} characters", p, c);
        Ok((p, c))
    }
}

impl RecordSource for JsonlRecordStore {
    fn players(&self) -> Result<Vec<Player>, StorageError> {
        let players = JsonlReader::<Player>::for_entity(&self.config, EntityType::Player).read_all()?;
        Ok(dedup_by_id(players))
    }

    fn characters(&self) -> Result<Vec<Character>, StorageError> {
        JsonlReader::for_entity(&self.config, EntityType::Character).read_all()
    }
}

/// In-memory record store.
#[derive(Default)]
pub struct MemoryRecordStore {
    players: RwLock<Vec<Player>>,
    characters: RwLock<Vec<Character>>,
}

impl MemoryRecordStore {
    pub fn new(players: Vec<Player>, characters: Vec<Character>) -> Self {
        Self {
            players: RwLock::new(players),
            characters: RwLock::new(characters),
        }
    }

    /// Replace the stored records.
    pub fn replace(
        &self,
        players: Vec<Player>,
        characters: Vec<Character>,
    ) -> Result<(), StorageError> {
        *self.players.write().map_err(poisoned)? = players;
        *self.characters.write().map_err(poisoned)? = characters;
        Ok(())
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Io(std::io::Error::other(e.to_string()))
}

impl RecordSource for MemoryRecordStore {
    fn players(&self) -> Result<Vec<Player>, StorageError> {
        let guard = self.players.read().map_err(poisoned)?;
        Ok(dedup_by_id(guard.clone()))
    }

    fn characters(&self) -> Result<Vec<Character>, StorageError> {
        let guard = self.characters.read().map_err(poisoned)?;
        Ok(guard.clone())
    }
}

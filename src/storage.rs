//! Persistence of trained networks and run statistics.
//!
//! The simulation never touches storage itself. Hosts hand a loaded network
//! to the trainer through [`TrainingContext`] and save generation winners
//! through a [`NetworkStore`]. Anything unreadable on load is treated as
//! absent, so a corrupt file means a random start rather than a failure.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::simulation::brain::Network;
use crate::simulation::trainer::{GenerationSummary, TrainingContext};

const BEST_NETWORK_FILE: &str = "best_network.json";
const CONTEXT_FILE: &str = "context.json";
const ARCHIVE_DIR: &str = "archive";
const ARCHIVE_PREFIX: &str = "brain_";

/// Errors raised while writing or managing stored networks.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization failure.
    #[error("storage serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    /// No archived network with this id.
    #[error("no saved network with id {0}")]
    UnknownEntry(String),
}

/// Context saved alongside a network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Generation the network won.
    pub generation: u32,
    /// Its fitness in that generation.
    pub fitness: f32,
    /// Its distance in that generation.
    pub distance: f32,
    /// When it was saved.
    pub saved_at: DateTime<Utc>,
}

impl RunMetadata {
    /// Metadata for a generation's winner, stamped now.
    pub fn from_summary(summary: &GenerationSummary) -> Self {
        Self {
            generation: summary.generation,
            fitness: summary.best_fitness,
            distance: summary.best_distance,
            saved_at: Utc::now(),
        }
    }
}

/// An archived network with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedNetwork {
    /// Archive id.
    pub id: String,
    /// The network.
    pub network: Network,
    /// Where it came from.
    pub metadata: RunMetadata,
}

/// Load/save interface implemented by hosts.
pub trait NetworkStore {
    /// The network to seed training from, if a valid one is stored.
    fn load_network(&self) -> Option<Network>;

    /// Stores `network` as the new seed and records it with `metadata`.
    fn save_network(
        &mut self,
        network: &Network,
        metadata: &RunMetadata,
    ) -> Result<(), StoreError>;
}

/// Store that keeps serialized networks in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    best: Option<String>,
    saved: Vec<(String, RunMetadata)>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored seed with raw JSON, as a host would read it back.
    pub fn put_raw(&mut self, json: impl Into<String>) {
        self.best = Some(json.into());
    }

    /// Metadata of every save, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &RunMetadata> {
        self.saved.iter().map(|(_, metadata)| metadata)
    }
}

impl NetworkStore for MemoryStore {
    fn load_network(&self) -> Option<Network> {
        parse_network(self.best.as_deref()?)
    }

    fn save_network(
        &mut self,
        network: &Network,
        metadata: &RunMetadata,
    ) -> Result<(), StoreError> {
        let json = network.to_json()?;
        self.saved.push((json.clone(), metadata.clone()));
        self.best = Some(json);
        Ok(())
    }
}

/// Directory-backed store.
///
/// Layout: `best_network.json` (seed), `context.json` (run statistics) and
/// `archive/brain_<millis>.json` (every saved winner with metadata).
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(ARCHIVE_DIR))?;
        Ok(Self { root })
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn best_path(&self) -> PathBuf {
        self.root.join(BEST_NETWORK_FILE)
    }

    fn context_path(&self) -> PathBuf {
        self.root.join(CONTEXT_FILE)
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.root.join(ARCHIVE_DIR).join(format!("{id}.json"))
    }

    fn next_id(&self, saved_at: &DateTime<Utc>) -> String {
        let base = format!("{ARCHIVE_PREFIX}{}", saved_at.timestamp_millis());
        let mut id = base.clone();
        let mut n = 1;
        while self.entry_path(&id).exists() {
            id = format!("{base}_{n}");
            n += 1;
        }
        id
    }

    /// Every archived network, fittest first. Unreadable entries are skipped.
    pub fn archive(&self) -> Result<Vec<SavedNetwork>, StoreError> {
        let mut saved = Vec::new();
        for entry in fs::read_dir(self.root.join(ARCHIVE_DIR))? {
            let path = entry?.path();
            let is_entry = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(ARCHIVE_PREFIX) && n.ends_with(".json"));
            if !is_entry {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|json| Ok(serde_json::from_str::<SavedNetwork>(&json)?))
            {
                Ok(network) => saved.push(network),
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable archive entry");
                }
            }
        }
        saved.sort_by(|a, b| b.metadata.fitness.total_cmp(&a.metadata.fitness));
        Ok(saved)
    }

    /// Makes an archived network the seed and returns the generation it won.
    pub fn promote(&mut self, id: &str) -> Result<u32, StoreError> {
        let path = self.entry_path(id);
        if !path.exists() {
            return Err(StoreError::UnknownEntry(id.to_string()));
        }
        let saved: SavedNetwork = serde_json::from_str(&fs::read_to_string(path)?)?;
        fs::write(self.best_path(), saved.network.to_json()?)?;

        let mut context = self.load_context();
        context.generation = saved.metadata.generation;
        self.save_context(&context)?;

        info!(id, generation = saved.metadata.generation, "promoted archived network");
        Ok(saved.metadata.generation)
    }

    /// Deletes an archived network; clears the seed once the archive is empty.
    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let path = self.entry_path(id);
        if !path.exists() {
            return Err(StoreError::UnknownEntry(id.to_string()));
        }
        fs::remove_file(path)?;

        if self.archive()?.is_empty() {
            remove_if_exists(&self.best_path())?;
        }
        Ok(())
    }

    /// Drops the seed network and resets run statistics. Archive entries stay.
    pub fn discard(&mut self) -> Result<(), StoreError> {
        remove_if_exists(&self.best_path())?;
        self.save_context(&TrainingContext::default())?;
        info!("discarded seed network");
        Ok(())
    }

    /// Run statistics, or defaults if none are stored or they are unreadable.
    pub fn load_context(&self) -> TrainingContext {
        let Ok(json) = fs::read_to_string(self.context_path()) else {
            return TrainingContext::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|err| {
            warn!(%err, "ignoring unreadable training context");
            TrainingContext::default()
        })
    }

    /// Writes run statistics. The carried network is not part of this file.
    pub fn save_context(&self, context: &TrainingContext) -> Result<(), StoreError> {
        fs::write(self.context_path(), serde_json::to_string_pretty(context)?)?;
        Ok(())
    }
}

impl NetworkStore for JsonFileStore {
    fn load_network(&self) -> Option<Network> {
        match fs::read_to_string(self.best_path()) {
            Ok(json) => parse_network(&json),
            Err(err) => {
                debug!(%err, "no stored seed network");
                None
            }
        }
    }

    fn save_network(
        &mut self,
        network: &Network,
        metadata: &RunMetadata,
    ) -> Result<(), StoreError> {
        let id = self.next_id(&metadata.saved_at);
        let saved = SavedNetwork {
            id: id.clone(),
            network: network.clone(),
            metadata: metadata.clone(),
        };
        fs::write(self.entry_path(&id), serde_json::to_string_pretty(&saved)?)?;
        fs::write(self.best_path(), network.to_json()?)?;

        info!(
            id = %id,
            generation = metadata.generation,
            fitness = metadata.fitness,
            "saved network"
        );
        Ok(())
    }
}

fn parse_network(json: &str) -> Option<Network> {
    match Network::from_json(json) {
        Ok(network) => Some(network),
        Err(err) => {
            warn!(%err, "rejecting stored network");
            None
        }
    }
}

fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
        _ => Ok(()),
    }
}

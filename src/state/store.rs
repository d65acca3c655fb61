//! Rotation state persistence
//!
//! The state lives in a small pretty-printed JSON file. Writes go to a
//! sibling temp file that is then renamed over the real one, so a reader
//! never sees a half-written state.

use crate::identity::IdentityPool;
use crate::state::rotation_state::{timestamp_now, RotationState};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while persisting rotation state
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// On-disk layout of the state file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(rename = "currentIndex", default)]
    pub current_index: usize,

    #[serde(rename = "usedServers", default)]
    pub used_servers: Vec<String>,

    #[serde(rename = "lastUpdated", default = "timestamp_now")]
    pub last_updated: String,

    /// Informational only; rewritten from the catalog on every save
    #[serde(rename = "totalServers", default)]
    pub total_servers: usize,
}

/// Durable store for `RotationState`
#[derive(Debug, Clone)]
pub struct RotationStateStore {
    path: PathBuf,
    pool: Arc<IdentityPool>,
}

impl RotationStateStore {
    pub fn new(path: impl Into<PathBuf>, pool: Arc<IdentityPool>) -> Self {
        Self {
            path: path.into(),
            pool,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool(&self) -> &Arc<IdentityPool> {
        &self.pool
    }

    /// Loads the persisted state
    ///
    /// A missing or unreadable file yields a fresh state. The loaded state is
    /// sanitised against the catalog: unknown names are dropped, an index past
    /// the end falls back to 0, and a used set covering the whole catalog
    /// starts a new cycle.
    pub fn load(&self) -> RotationState {
        let file = match self.read_file() {
            Ok(Some(file)) => file,
            Ok(None) => {
                info!("No saved rotation state, starting from the beginning");
                return RotationState::new();
            }
            Err(e) => {
                warn!(
                    "Rotation state at {} is unreadable, starting fresh: {}",
                    self.path.display(),
                    e
                );
                return RotationState::new();
            }
        };

        let size = self.pool.size();
        let mut state = RotationState {
            current_index: file.current_index,
            used: Vec::with_capacity(file.used_servers.len()),
            last_updated: file.last_updated,
        };

        for name in file.used_servers {
            if self.pool.contains(&name) {
                state.mark_used(&name);
            } else {
                warn!("Dropping unknown identity '{}' from rotation state", name);
            }
        }

        if state.current_index >= size {
            warn!(
                "Saved identity index {} is outside the catalog ({}), resetting to 0",
                state.current_index, size
            );
            state.current_index = 0;
        }

        if size > 0 && state.used.len() >= size {
            info!("All {} identities were used, starting a new cycle", size);
            return RotationState::new();
        }

        info!(
            "Loaded rotation state: identity #{}, used {}/{} (last updated {})",
            state.current_index,
            state.used.len(),
            size,
            state.last_updated
        );

        state
    }

    /// Persists `state` atomically
    pub fn save(&self, state: &RotationState) -> Result<(), PersistenceError> {
        let file = StateFile {
            current_index: state.current_index,
            used_servers: state.used.clone(),
            last_updated: state.last_updated.clone(),
            total_servers: self.pool.size(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(parent, e))?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut temp = std::fs::File::create(&temp_path)
                .map_err(|e| self.io_error(&temp_path, e))?;
            temp.write_all(json.as_bytes())
                .map_err(|e| self.io_error(&temp_path, e))?;
            temp.sync_all().map_err(|e| self.io_error(&temp_path, e))?;
        }
        std::fs::rename(&temp_path, &self.path).map_err(|e| self.io_error(&self.path, e))?;

        debug!(
            "Rotation state saved: identity #{}, used {}/{}",
            file.current_index,
            file.used_servers.len(),
            file.total_servers
        );
        Ok(())
    }

    /// Reads the raw state file without sanitising it
    ///
    /// Returns `Ok(None)` when no state has been saved yet.
    pub fn read_file(&self) -> Result<Option<StateFile>, PersistenceError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(&self.path, e)),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Removes the state file so the next run starts a fresh cycle
    pub fn clear(&self) -> Result<bool, PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.io_error(&self.path, e)),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

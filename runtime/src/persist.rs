//! The persistence boundary.
//!
//! A store persists a whitelist of resources: only their slices are
//! serialized, and everything else starts from the initial state on the next
//! run. Slice state is plain data (`loading` / `data` / `error` over JSON
//! values) so the snapshot is a straightforward serde round trip with no
//! function values and no cyclic references.

use chrono::{DateTime, Utc};
use fetchflow_core::SliceState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Errors crossing the persistence boundary
#[derive(Error, Debug)]
pub enum PersistError {
    /// The storage medium failed
    #[error("snapshot storage failed: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be serialized or deserialized
    #[error("snapshot serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A serialized view of the whitelisted slices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedTree {
    /// When the snapshot was taken
    pub saved_at: DateTime<Utc>,
    /// Slice state per whitelisted resource name
    pub slices: HashMap<String, SliceState>,
}

impl PersistedTree {
    /// Snapshot the given slices now.
    #[must_use]
    pub fn new(slices: HashMap<String, SliceState>) -> Self {
        Self {
            saved_at: Utc::now(),
            slices,
        }
    }
}

/// Where snapshots live.
///
/// Implementations are synchronous: snapshots are taken at composition
/// points (startup, shutdown), not on the dispatch hot path.
pub trait SnapshotStorage: Send + Sync {
    /// Load the last snapshot, or `None` when none was ever saved.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the medium fails or the snapshot does
    /// not deserialize.
    fn load(&self) -> Result<Option<PersistedTree>, PersistError>;

    /// Save a snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the medium fails or the snapshot does
    /// not serialize.
    fn save(&self, tree: &PersistedTree) -> Result<(), PersistError>;
}

/// Snapshots as pretty-printed JSON in a single file.
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Store snapshots at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<PersistedTree>, PersistError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, tree: &PersistedTree) -> Result<(), PersistError> {
        let raw = serde_json::to_string_pretty(tree)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

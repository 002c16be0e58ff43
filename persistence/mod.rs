/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Snapshot persistence.
//!
//! The tree serializes to a flat, storage-safe snapshot (see `types`); this
//! module owns the storage seam and the JSON codec. Storage semantics are
//! deliberately weak: last write wins, read-after-write is not guaranteed
//! across processes, and a corrupt or missing snapshot degrades to a cold
//! start instead of failing the load.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::persistence::types::TreeSnapshot;

/// Errors from snapshot storage.
#[derive(Debug)]
pub enum StoreError {
    Io(String),
    Codec(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {e}"),
            StoreError::Codec(e) => write!(f, "Codec error: {e}"),
        }
    }
}

/// Storage seam for tree snapshots.
pub trait SnapshotStore {
    /// `Ok(None)` on cold start (nothing stored yet, or nothing readable).
    fn load(&self) -> Result<Option<TreeSnapshot>, StoreError>;
    fn save(&mut self, snapshot: &TreeSnapshot) -> Result<(), StoreError>;
}

pub fn snapshot_to_json(snapshot: &TreeSnapshot) -> Result<String, StoreError> {
    serde_json::to_string_pretty(snapshot).map_err(|e| StoreError::Codec(e.to_string()))
}

pub fn snapshot_from_json(raw: &str) -> Result<TreeSnapshot, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Codec(e.to_string()))
}

/// Snapshot storage in a single JSON file.
///
/// Saves write to a sibling temp file and rename into place, so a crash
/// mid-write leaves the previous snapshot intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<TreeSnapshot>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };
        match snapshot_from_json(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!(
                    "Discarding unreadable snapshot at {}: {err}",
                    self.path.display()
                );
                Ok(None)
            }
        }
    }

    fn save(&mut self, snapshot: &TreeSnapshot) -> Result<(), StoreError> {
        let raw = snapshot_to_json(snapshot)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw.as_bytes()).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        debug!(
            "Saved snapshot with {} node(s) to {}",
            snapshot.nodes.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Option<TreeSnapshot>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed saves, for asserting write ordering.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<TreeSnapshot>, StoreError> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, snapshot: &TreeSnapshot) -> Result<(), StoreError> {
        self.snapshot = Some(snapshot.clone());
        self.saves += 1;
        Ok(())
    }
}

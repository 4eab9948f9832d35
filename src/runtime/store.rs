//! Progress Persistence
//!
//! Lifetime counters and unlocked achievements, saved between runs. The
//! simulation never waits on the store; the driver logs failures and keeps
//! the dirty flag set so the next save retries.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::debug;

use crate::game::progress::ProgressSnapshot;

/// Progress store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not a valid snapshot.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store cannot be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Somewhere to keep lifetime progress.
pub trait ProgressStore {
    /// Load the saved snapshot, or `None` if nothing was saved yet.
    fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError>;

    /// Replace the saved snapshot.
    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError>;
}

// =============================================================================
// JSON FILE
// =============================================================================

/// Snapshot as a pretty-printed JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path`. Nothing is touched until the first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot = serde_json::from_str(&raw)?;
        debug!("loaded progress from {}", self.path.display());
        Ok(Some(snapshot))
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snapshot)?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        // Write aside then rename so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("saved progress to {}", self.path.display());
        Ok(())
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-memory store. Clones share the same slot, so a caller can keep a
/// handle after giving one to the driver.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slot: Arc<Mutex<Option<ProgressSnapshot>>>,
    offline: bool,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with a snapshot.
    pub fn with_snapshot(snapshot: ProgressSnapshot) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(snapshot))),
            offline: false,
        }
    }

    /// Store that fails every call.
    pub fn unavailable() -> Self {
        Self {
            slot: Arc::default(),
            offline: true,
        }
    }

    /// Last saved snapshot.
    pub fn saved(&self) -> Option<ProgressSnapshot> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl ProgressStore for MemoryStore {
    fn load(&mut self) -> Result<Option<ProgressSnapshot>, StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        let slot = self
            .slot
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        Ok(slot.clone())
    }

    fn save(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store poisoned".into()))?;
        *slot = Some(snapshot.clone());
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::progress::{Metric, ProgressTracker};

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir()
            .join(format!("cactus-quest-{}-{}-{}", name, std::process::id(), nanos))
            .join("progress.json")
    }

    fn sample() -> ProgressSnapshot {
        let mut tracker = ProgressTracker::new();
        tracker.increment(Metric::Jumps, 12.0);
        tracker.increment(Metric::FlowersCollected, 100.0);
        tracker.snapshot()
    }

    #[test]
    fn test_json_store_missing_file_is_empty() {
        let mut store = JsonFileStore::new(scratch_path("missing"));
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn test_json_store_persists_counters_and_unlocks() {
        let path = scratch_path("persist");
        let snapshot = sample();

        JsonFileStore::new(&path).save(&snapshot).expect("save");
        let loaded = JsonFileStore::new(&path).load().expect("load").expect("snapshot");
        assert_eq!(loaded, snapshot);
        assert!(loaded.unlocked.contains_key("collector"));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let path = scratch_path("garbage");
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).expect("mkdir");
        }
        std::fs::write(&path, "not json").expect("write");

        let err = JsonFileStore::new(&path).load().unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_memory_store_handles_share_slot() {
        let store = MemoryStore::new();
        let snapshot = sample();
        let mut writer = store.clone();
        writer.save(&snapshot).expect("save");
        assert_eq!(store.saved(), Some(snapshot));
    }

    #[test]
    fn test_unavailable_store_fails_both_ways() {
        let mut store = MemoryStore::unavailable();
        assert!(matches!(store.load(), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.save(&sample()), Err(StoreError::Unavailable(_))));
    }
}

//! Per-folder index handle.
//!
//! One handle per canonicalized folder path, held in the manager's
//! registry. Readers take an `Arc` snapshot of the current state and
//! never block on a build; the builder swaps a fully-staged state in
//! after persisting it. The build lock serializes writers per folder.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use crate::error::IndexError;
use crate::state::IndexState;

pub(crate) struct FolderIndex {
    /// Sidecar directory holding the persisted files
    pub(crate) sidecar: PathBuf,
    /// Current snapshot; None until loaded or first persisted
    state: RwLock<Option<Arc<IndexState>>>,
    /// Serializes build_or_update per folder
    pub(crate) build_lock: Mutex<()>,
}

impl FolderIndex {
    pub fn new(sidecar: PathBuf) -> Self {
        Self {
            sidecar,
            state: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Current snapshot if one is in memory.
    pub fn snapshot(&self) -> Result<Option<Arc<IndexState>>, IndexError> {
        let guard = self
            .state
            .read()
            .map_err(|e| IndexError::State(format!("failed to acquire read lock: {e}")))?;
        Ok(guard.clone())
    }

    /// Snapshot, loading the persisted state on first access.
    /// Returns None when no persisted index exists.
    pub fn ensure_loaded(&self) -> Result<Option<Arc<IndexState>>, IndexError> {
        if let Some(state) = self.snapshot()? {
            return Ok(Some(state));
        }

        let mut guard = self
            .state
            .write()
            .map_err(|e| IndexError::State(format!("failed to acquire write lock: {e}")))?;
        // Another thread may have loaded while we waited for the lock
        if guard.is_none() {
            match IndexState::load(&self.sidecar)? {
                Some(loaded) => *guard = Some(Arc::new(loaded)),
                None => return Ok(None),
            }
        }
        Ok(guard.clone())
    }

    /// Publish a new snapshot. Called only after the state was
    /// persisted, so readers never get ahead of the disk.
    pub fn swap(&self, next: Arc<IndexState>) -> Result<(), IndexError> {
        let mut guard = self
            .state
            .write()
            .map_err(|e| IndexError::State(format!("failed to acquire write lock: {e}")))?;
        *guard = Some(next);
        Ok(())
    }
}

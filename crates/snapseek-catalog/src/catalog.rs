//! Catalog entries and the ordered path/metadata record.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::CatalogError;

/// One indexed image: absolute path plus filesystem metadata captured
/// at index time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Absolute path of the image file
    pub path: String,
    /// Modification time at index time (unix seconds)
    pub mtime: i64,
    /// File size in bytes at index time
    pub size: u64,
}

impl CatalogEntry {
    pub fn new(path: impl Into<String>, mtime: i64, size: u64) -> Self {
        Self {
            path: path.into(),
            mtime,
            size,
        }
    }
}

/// Ordered, append-only record of indexed images.
///
/// Positions are append order and match vector-store positions exactly.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    by_path: HashMap<String, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append one entry. Must be called in the same order, and exactly
    /// once per vector, as the vector store append.
    pub fn append(&mut self, entry: CatalogEntry) -> Result<(), CatalogError> {
        if self.by_path.contains_key(&entry.path) {
            return Err(CatalogError::DuplicatePath(entry.path));
        }
        self.by_path.insert(entry.path.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    /// Given the files currently present on disk, return those not yet
    /// indexed, preserving the scan order.
    pub fn diff(&self, scanned: &[PathBuf]) -> Vec<PathBuf> {
        scanned
            .iter()
            .filter(|p| !self.by_path.contains_key(p.to_string_lossy().as_ref()))
            .cloned()
            .collect()
    }

    /// Look up the entry at a position.
    pub fn by_position(&self, position: usize) -> Option<&CatalogEntry> {
        self.entries.get(position)
    }

    /// Find the position of a path.
    pub fn find(&self, path: &str) -> Option<usize> {
        self.by_path.get(path).copied()
    }

    /// Iterate entries in position order.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Iterate indexed paths in position order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    /// Save the catalog as JSON Lines, one entry per line, replacing the
    /// destination atomically.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(&tmp);
            for entry in &self.entries {
                let line = serde_json::to_string(entry)
                    .map_err(|e| CatalogError::Serialization(e.to_string()))?;
                writeln!(writer, "{}", line)?;
            }
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| CatalogError::Io(e.error))?;

        info!(path = ?path, entries = self.entries.len(), "Saved catalog");
        Ok(())
    }

    /// Load a catalog from JSON Lines. Malformed lines and duplicate
    /// paths are rejected; a damaged catalog must not be silently
    /// truncated into a misaligned one.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);

        let mut catalog = Catalog::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: CatalogEntry =
                serde_json::from_str(&line).map_err(|e| CatalogError::Parse {
                    line: i + 1,
                    reason: e.to_string(),
                })?;
            catalog.append(entry)?;
        }

        debug!(path = ?path, entries = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }
}

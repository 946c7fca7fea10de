//! Persisted index state: the vector store / catalog pair for one
//! folder.
//!
//! The two files are written together and validated against each other
//! on load; a lone file or a length mismatch is corruption, never
//! silently tolerated.

use std::path::Path;

use tracing::{debug, info};

use snapseek_catalog::Catalog;
use snapseek_vector::FlatStore;

use crate::error::IndexError;

/// Vector store file inside the sidecar directory.
pub(crate) const VECTORS_FILE: &str = "vectors.bin";
/// Catalog file inside the sidecar directory.
pub(crate) const CATALOG_FILE: &str = "catalog.jsonl";
/// Comment log inside the sidecar directory (independent lifecycle).
pub(crate) const COMMENTS_FILE: &str = "comments.json";

/// In-memory index for one folder. Immutable once shared: builders
/// stage a new state and swap, they never mutate a published one.
#[derive(Debug, Clone, Default)]
pub(crate) struct IndexState {
    pub vectors: FlatStore,
    pub catalog: Catalog,
}

impl IndexState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Check for a persisted index without loading it.
    pub fn is_persisted(dir: &Path) -> bool {
        dir.join(VECTORS_FILE).exists() && dir.join(CATALOG_FILE).exists()
    }

    /// Load the persisted state, or None if no index exists yet.
    pub fn load(dir: &Path) -> Result<Option<Self>, IndexError> {
        let vectors_path = dir.join(VECTORS_FILE);
        let catalog_path = dir.join(CATALOG_FILE);

        match (vectors_path.exists(), catalog_path.exists()) {
            (false, false) => Ok(None),
            (true, true) => {
                let vectors = FlatStore::load(&vectors_path)?;
                let catalog = Catalog::load(&catalog_path)?;
                if vectors.len() != catalog.len() {
                    return Err(IndexError::CorruptIndex(format!(
                        "vector count {} does not match catalog count {}",
                        vectors.len(),
                        catalog.len()
                    )));
                }
                info!(dir = ?dir, entries = catalog.len(), "Loaded index");
                Ok(Some(Self { vectors, catalog }))
            }
            (vectors_present, _) => Err(IndexError::CorruptIndex(format!(
                "index incomplete: {} is missing",
                if vectors_present {
                    CATALOG_FILE
                } else {
                    VECTORS_FILE
                }
            ))),
        }
    }

    /// Persist both halves into the sidecar directory.
    pub fn persist(&self, dir: &Path) -> Result<(), IndexError> {
        if self.vectors.len() != self.catalog.len() {
            return Err(IndexError::State(format!(
                "refusing to persist misaligned index: {} vectors, {} catalog entries",
                self.vectors.len(),
                self.catalog.len()
            )));
        }

        std::fs::create_dir_all(dir)?;
        self.vectors.save(&dir.join(VECTORS_FILE))?;
        self.catalog.save(&dir.join(CATALOG_FILE))?;

        debug!(dir = ?dir, entries = self.len(), "Persisted index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapseek_catalog::CatalogEntry;
    use snapseek_embeddings::Embedding;
    use tempfile::TempDir;

    fn sample_state(n: usize) -> IndexState {
        let mut state = IndexState::empty();
        let vectors: Vec<Embedding> = (0..n)
            .map(|i| Embedding::new(vec![i as f32 + 1.0, 1.0, 0.5]))
            .collect();
        state.vectors.add(&vectors).unwrap();
        for i in 0..n {
            state
                .catalog
                .append(CatalogEntry::new(format!("/photos/{i}.jpg"), i as i64, 10))
                .unwrap();
        }
        state
    }

    #[test]
    fn test_load_missing_returns_none() {
        let temp = TempDir::new().unwrap();
        assert!(IndexState::load(temp.path()).unwrap().is_none());
        assert!(!IndexState::is_persisted(temp.path()));
    }

    #[test]
    fn test_persist_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".snapseek");

        let state = sample_state(4);
        state.persist(&dir).unwrap();
        assert!(IndexState::is_persisted(&dir));

        let loaded = IndexState::load(&dir).unwrap().unwrap();
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.vectors.len(), loaded.catalog.len());
        assert_eq!(loaded.catalog.by_position(2).unwrap().path, "/photos/2.jpg");
    }

    #[test]
    fn test_load_rejects_lone_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".snapseek");

        let state = sample_state(2);
        state.persist(&dir).unwrap();
        std::fs::remove_file(dir.join(CATALOG_FILE)).unwrap();

        let result = IndexState::load(&dir);
        assert!(matches!(result, Err(IndexError::CorruptIndex(_))));
    }

    #[test]
    fn test_load_rejects_length_mismatch() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".snapseek");

        let state = sample_state(3);
        state.persist(&dir).unwrap();

        // Rewrite the catalog with one entry fewer
        let truncated = sample_state(2);
        truncated.catalog.save(&dir.join(CATALOG_FILE)).unwrap();

        let result = IndexState::load(&dir);
        assert!(matches!(result, Err(IndexError::CorruptIndex(_))));
    }

    #[test]
    fn test_persist_refuses_misaligned_state() {
        let temp = TempDir::new().unwrap();
        let mut state = sample_state(2);
        state
            .catalog
            .append(CatalogEntry::new("/photos/extra.jpg", 99, 10))
            .unwrap();

        let result = state.persist(temp.path());
        assert!(matches!(result, Err(IndexError::State(_))));
    }
}

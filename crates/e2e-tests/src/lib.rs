//! End-to-end test infrastructure for snapseek.
//!
//! Provides a shared TestHarness and deterministic embedding providers
//! for tests covering the full scan-to-search pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use snapseek_embeddings::{Embedding, EmbeddingError, EmbeddingProvider, ProviderInfo};
use snapseek_index::{IndexConfig, IndexManager};

/// Embedding dimension used across e2e tests.
pub const TEST_DIM: usize = 8;

/// Deterministic embedder: the vector is a pure function of the file
/// bytes (or query text), so re-embedding identical content reproduces
/// the identical unit vector. Stands in for the external model, which
/// tests never load.
pub struct HashProvider {
    info: ProviderInfo,
}

impl HashProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            info: ProviderInfo {
                name: "hash-e2e".to_string(),
                dimension,
            },
        }
    }

    pub fn embed_bytes(&self, bytes: &[u8]) -> Embedding {
        let mut values = vec![0.1f32; self.info.dimension];
        for (i, b) in bytes.iter().enumerate() {
            values[i % self.info.dimension] += (*b as f32) * (((i % 7) + 1) as f32);
        }
        Embedding::new(values)
    }
}

impl EmbeddingProvider for HashProvider {
    fn info(&self) -> &ProviderInfo {
        &self.info
    }

    fn embed_image(&self, path: &Path) -> Result<Embedding, EmbeddingError> {
        let bytes = std::fs::read(path)?;
        Ok(self.embed_bytes(&bytes))
    }

    fn embed_text(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        Ok(self.embed_bytes(text.as_bytes()))
    }
}

/// HashProvider with an artificial per-image delay, wide enough for
/// concurrency tests to overlap a build with other calls.
pub struct SlowProvider {
    inner: HashProvider,
    delay: Duration,
}

impl SlowProvider {
    pub fn new(dimension: usize, delay: Duration) -> Self {
        Self {
            inner: HashProvider::new(dimension),
            delay,
        }
    }
}

impl EmbeddingProvider for SlowProvider {
    fn info(&self) -> &ProviderInfo {
        self.inner.info()
    }

    fn embed_image(&self, path: &Path) -> Result<Embedding, EmbeddingError> {
        std::thread::sleep(self.delay);
        self.inner.embed_image(path)
    }

    fn embed_text(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.inner.embed_text(text)
    }
}

/// Shared test harness: a temp image folder plus manager constructors.
pub struct TestHarness {
    /// Keeps the temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// The image folder under test
    pub folder: PathBuf,
}

impl TestHarness {
    /// Create a harness with an empty image folder.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let folder = temp_dir.path().join("photos");
        std::fs::create_dir_all(&folder).expect("Failed to create image folder");
        Self {
            _temp_dir: temp_dir,
            folder,
        }
    }

    /// Write a fake image file. Content bytes drive the hash embedding,
    /// so distinct content means a distinct vector.
    pub fn add_image(&self, name: &str, content: &str) -> PathBuf {
        let path = self.folder.join(name);
        std::fs::write(&path, content).expect("Failed to write image fixture");
        path
    }

    /// The canonical path string under which an image is cataloged.
    pub fn catalog_key(&self, name: &str) -> String {
        std::fs::canonicalize(self.folder.join(name))
            .expect("Failed to canonicalize image path")
            .to_string_lossy()
            .into_owned()
    }

    /// Manager with the deterministic hash provider and defaults.
    pub fn manager(&self) -> IndexManager {
        IndexManager::new(Arc::new(HashProvider::new(TEST_DIM)), IndexConfig::default())
    }

    /// Manager whose provider sleeps per image.
    pub fn slow_manager(&self, delay: Duration) -> IndexManager {
        IndexManager::new(
            Arc::new(SlowProvider::new(TEST_DIM, delay)),
            IndexConfig::default(),
        )
    }

    /// Slow manager with a small batch size, so builds publish several
    /// intermediate snapshots that concurrency tests can observe.
    pub fn slow_manager_with_batch(&self, delay: Duration, batch_size: usize) -> IndexManager {
        let config = IndexConfig {
            batch_size,
            ..Default::default()
        };
        IndexManager::new(Arc::new(SlowProvider::new(TEST_DIM, delay)), config)
    }

    /// Path of the persisted sidecar directory.
    pub fn sidecar(&self) -> PathBuf {
        self.folder.join(".snapseek")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

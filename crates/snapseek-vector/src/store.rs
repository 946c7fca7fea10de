//! Flat vector store with exact search.
//!
//! Vectors live in one contiguous f32 buffer; position i covers
//! `data[i*D .. (i+1)*D]`. Positions are append order and are never
//! reused, which is what keeps the store aligned with its catalog.

use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use snapseek_embeddings::Embedding;

use crate::error::VectorError;

/// One search hit: position in the store plus inner-product score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Ordinal position of the matched vector (append order)
    pub position: usize,
    /// Inner-product score (cosine similarity for unit vectors)
    pub score: f32,
}

/// On-disk form of the store.
#[derive(Serialize, Deserialize)]
struct StoredVectors {
    dimension: u64,
    count: u64,
    data: Vec<f32>,
}

/// Append-only flat vector store with exact brute-force search.
#[derive(Debug, Clone, Default)]
pub struct FlatStore {
    dimension: Option<usize>,
    data: Vec<f32>,
    count: usize,
}

impl FlatStore {
    /// Create an empty store. The dimension is fixed by the first add.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with a pre-set dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            data: Vec::new(),
            count: 0,
        }
    }

    /// Dimension of stored vectors, or None if nothing was added yet.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Append a batch of vectors.
    ///
    /// The first vector ever added fixes the store dimension. The whole
    /// batch is validated before anything is appended, so a mismatch
    /// never leaves a partial batch behind.
    pub fn add(&mut self, vectors: &[Embedding]) -> Result<(), VectorError> {
        if vectors.is_empty() {
            return Ok(());
        }

        let expected = self.dimension.unwrap_or_else(|| vectors[0].dimension());
        for vector in vectors {
            if vector.dimension() != expected {
                return Err(VectorError::DimensionMismatch {
                    expected,
                    actual: vector.dimension(),
                });
            }
        }

        self.dimension = Some(expected);
        self.data.reserve(vectors.len() * expected);
        for vector in vectors {
            self.data.extend_from_slice(&vector.values);
        }
        self.count += vectors.len();

        debug!(added = vectors.len(), total = self.count, "Appended vectors");
        Ok(())
    }

    /// Exact top-k search by inner product.
    ///
    /// Returns hits ordered by score descending, ties broken by lower
    /// position. `k` is clamped to `[0, len]`; an empty store returns an
    /// empty list for any `k`.
    pub fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchHit>, VectorError> {
        if self.count == 0 {
            return Ok(Vec::new());
        }

        let dimension = self.dimension.unwrap_or(0);
        if query.dimension() != dimension {
            return Err(VectorError::DimensionMismatch {
                expected: dimension,
                actual: query.dimension(),
            });
        }

        let k = k.min(self.count);
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(dimension)
            .enumerate()
            .map(|(position, row)| {
                let score: f32 = row
                    .iter()
                    .zip(query.values.iter())
                    .map(|(a, b)| a * b)
                    .sum();
                SearchHit { position, score }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);

        debug!(k = k, scanned = self.count, "Search complete");
        Ok(hits)
    }

    /// Save the store to a file.
    ///
    /// Writes to a temp file in the target directory and renames over
    /// the destination, so a crash mid-write never leaves a torn file.
    pub fn save(&self, path: &Path) -> Result<(), VectorError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let stored = StoredVectors {
            dimension: self.dimension.unwrap_or(0) as u64,
            count: self.count as u64,
            data: self.data.clone(),
        };

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(&tmp);
            bincode::serialize_into(&mut writer, &stored)
                .map_err(|e| VectorError::Serialization(e.to_string()))?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| VectorError::Io(e.error))?;

        info!(path = ?path, vectors = self.count, "Saved vector store");
        Ok(())
    }

    /// Load a store from a file, validating buffer length against the
    /// recorded dimension and count.
    pub fn load(path: &Path) -> Result<Self, VectorError> {
        let file = std::fs::File::open(path)?;
        let stored: StoredVectors = bincode::deserialize_from(BufReader::new(file))
            .map_err(|e| VectorError::Serialization(e.to_string()))?;

        let dimension = stored.dimension as usize;
        let count = stored.count as usize;
        if stored.data.len() != dimension * count {
            return Err(VectorError::Corrupt(format!(
                "expected {} floats for {} vectors of dimension {}, found {}",
                dimension * count,
                count,
                dimension,
                stored.data.len()
            )));
        }

        info!(path = ?path, vectors = count, dim = dimension, "Loaded vector store");
        Ok(Self {
            dimension: if count == 0 && dimension == 0 {
                None
            } else {
                Some(dimension)
            },
            data: stored.data,
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unit(values: Vec<f32>) -> Embedding {
        Embedding::new(values)
    }

    fn random_embedding(dim: usize) -> Embedding {
        use rand::Rng;
        let mut rng = rand::rng();
        let values: Vec<f32> = (0..dim).map(|_| rng.random()).collect();
        Embedding::new(values)
    }

    #[test]
    fn test_empty_store_search() {
        let store = FlatStore::new();
        let hits = store.search(&unit(vec![1.0, 0.0]), 10).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_first_add_fixes_dimension() {
        let mut store = FlatStore::new();
        assert_eq!(store.dimension(), None);

        store.add(&[unit(vec![1.0, 0.0, 0.0])]).unwrap();
        assert_eq!(store.dimension(), Some(3));
        assert_eq!(store.len(), 1);

        let result = store.add(&[unit(vec![1.0, 0.0])]);
        assert!(matches!(
            result,
            Err(VectorError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        // Failed batch must not have touched the store
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_mixed_batch_rejected_whole() {
        let mut store = FlatStore::new();
        let result = store.add(&[unit(vec![1.0, 0.0]), unit(vec![1.0, 0.0, 0.0])]);
        assert!(matches!(result, Err(VectorError::DimensionMismatch { .. })));
        assert_eq!(store.len(), 0);
        assert_eq!(store.dimension(), None);
    }

    #[test]
    fn test_search_orders_by_score() {
        let mut store = FlatStore::new();
        store
            .add(&[
                unit(vec![0.0, 1.0]),
                unit(vec![1.0, 0.0]),
                unit(vec![1.0, 1.0]),
            ])
            .unwrap();

        let hits = store.search(&unit(vec![1.0, 0.0]), 3).unwrap();
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].position, 1);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert_eq!(hits[1].position, 2);
        assert_eq!(hits[2].position, 0);
    }

    #[test]
    fn test_search_ties_break_by_position() {
        let mut store = FlatStore::new();
        // Two identical vectors: equal scores, lower position wins
        store
            .add(&[
                unit(vec![0.0, 1.0]),
                unit(vec![1.0, 0.0]),
                unit(vec![1.0, 0.0]),
            ])
            .unwrap();

        let hits = store.search(&unit(vec![1.0, 0.0]), 2).unwrap();
        assert_eq!(hits[0].position, 1);
        assert_eq!(hits[1].position, 2);
    }

    #[test]
    fn test_k_clamped_to_count() {
        let mut store = FlatStore::new();
        store.add(&[unit(vec![1.0, 0.0]), unit(vec![0.0, 1.0])]).unwrap();

        let hits = store.search(&unit(vec![1.0, 0.0]), 100).unwrap();
        assert_eq!(hits.len(), 2);

        let hits = store.search(&unit(vec![1.0, 0.0]), 0).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let mut store = FlatStore::new();
        store.add(&[unit(vec![1.0, 0.0, 0.0])]).unwrap();

        let result = store.search(&unit(vec![1.0, 0.0]), 1);
        assert!(matches!(result, Err(VectorError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vectors.bin");

        let mut store = FlatStore::new();
        let vectors: Vec<Embedding> = (0..10).map(|_| random_embedding(16)).collect();
        store.add(&vectors).unwrap();
        store.save(&path).unwrap();

        let loaded = FlatStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 10);
        assert_eq!(loaded.dimension(), Some(16));

        // Searching the reloaded store with a stored vector finds it first
        let hits = loaded.search(&vectors[3], 1).unwrap();
        assert_eq!(hits[0].position, 3);
        assert!((hits[0].score - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_save_empty_store() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vectors.bin");

        FlatStore::new().save(&path).unwrap();
        let loaded = FlatStore::load(&path).unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.dimension(), None);
    }

    #[test]
    fn test_load_rejects_truncated_data() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vectors.bin");

        let stored = StoredVectors {
            dimension: 4,
            count: 3,
            data: vec![0.5; 7],
        };
        let file = std::fs::File::create(&path).unwrap();
        bincode::serialize_into(BufWriter::new(file), &stored).unwrap();

        let result = FlatStore::load(&path);
        assert!(matches!(result, Err(VectorError::Corrupt(_))));
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vectors.bin");

        let mut store = FlatStore::new();
        store.add(&[unit(vec![1.0, 0.0])]).unwrap();
        store.save(&path).unwrap();

        store.add(&[unit(vec![0.0, 1.0])]).unwrap();
        store.save(&path).unwrap();

        let loaded = FlatStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
    }
}

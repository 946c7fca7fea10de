//! Embedding value type and provider trait.
//!
//! Defines the interface for turning images and text into vectors.

use std::path::Path;

use crate::error::EmbeddingError;

/// Vector embedding - a normalized float array.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// The embedding vector (normalized to unit length)
    pub values: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding from a vector.
    /// Normalizes the vector to unit length. This is the only place
    /// normalization happens; stores and providers never re-normalize.
    pub fn new(values: Vec<f32>) -> Self {
        let norm: f32 = values.iter().map(|x| x * x).sum::<f32>().sqrt();
        let normalized = if norm > 0.0 {
            values.iter().map(|x| x / norm).collect()
        } else {
            values
        };
        Self { values: normalized }
    }

    /// Create embedding without normalization (for pre-normalized vectors)
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Compute cosine similarity with another embedding.
    /// Returns value in [-1, 1] range (1 = identical).
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }
        // Since both are normalized, dot product = cosine similarity
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a * b)
            .sum()
    }
}

/// Provider information
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// Model name (e.g., "ViT-B/32")
    pub name: String,
    /// Embedding dimension
    pub dimension: usize,
}

/// Trait for embedding providers.
///
/// Implementations must be thread-safe (Send + Sync); the index manager
/// shares one provider handle across folders. Calls are expensive and
/// may block on inference for seconds.
pub trait EmbeddingProvider: Send + Sync {
    /// Get provider information
    fn info(&self) -> &ProviderInfo;

    /// Embedding dimension produced by this provider.
    fn dimension(&self) -> usize {
        self.info().dimension
    }

    /// Generate an embedding for an image file.
    fn embed_image(&self, path: &Path) -> Result<Embedding, EmbeddingError>;

    /// Generate an embedding for a text query.
    fn embed_text(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    /// Generate embeddings for multiple image files.
    ///
    /// Results are positionally aligned with `paths`. Each item carries
    /// its own Result so a single undecodable file does not fail the
    /// batch. Default implementation calls embed_image() per path;
    /// providers that batch on-device should override it.
    fn embed_image_batch(&self, paths: &[&Path]) -> Vec<Result<Embedding, EmbeddingError>> {
        paths.iter().map(|path| self.embed_image(path)).collect()
    }
}

//! Index manager error types.

use std::path::PathBuf;

use thiserror::Error;

use snapseek_annotations::AnnotationError;
use snapseek_catalog::CatalogError;
use snapseek_embeddings::EmbeddingError;
use snapseek_vector::VectorError;

/// Errors that can occur during index operations.
///
/// `NoImagesFound`, `NotIndexed` and `BuildInProgress` are terminal,
/// reportable outcomes for a call, not conditions to retry.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Path missing, not a directory, or outside the allowed root
    #[error("Invalid folder: {0}")]
    InvalidFolder(PathBuf),

    /// Scan yielded zero supported image files on a first build
    #[error("No images found in folder")]
    NoImagesFound,

    /// No persisted index exists for the folder
    #[error("Folder is not indexed")]
    NotIndexed,

    /// Another build is running for the same folder
    #[error("Indexing already in progress for this folder")]
    BuildInProgress,

    /// Loaded index does not match the provider's embedding dimension
    #[error("Dimension mismatch: index has {expected}, provider produces {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Persisted index failed validation on load
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// Internal state error (poisoned lock)
    #[error("Index state error: {0}")]
    State(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Vector store error
    #[error("Vector store error: {0}")]
    Vector(#[from] VectorError),

    /// Catalog error
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Embedding error (query embedding; per-file build failures are
    /// recovered by skipping the file)
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Annotation error
    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotationError),
}

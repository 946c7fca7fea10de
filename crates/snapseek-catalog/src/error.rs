//! Catalog error types.

use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Path already present in the catalog
    #[error("Duplicate path in catalog: {0}")]
    DuplicatePath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed persisted record
    #[error("Malformed catalog record at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

//! Annotation error types.

use thiserror::Error;

/// Errors that can occur during annotation operations.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// Comment was empty after trimming
    #[error("Comment is empty")]
    EmptyComment,

    /// Comment exceeds the configured maximum length
    #[error("Comment too long (max {max} characters)")]
    CommentTooLong { max: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

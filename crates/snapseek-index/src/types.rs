//! Public result types for the index manager.

use serde::{Deserialize, Serialize};

/// Outcome of a build_or_update call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Images newly embedded and appended by this call
    pub added_count: usize,
    /// Total images in the index after the call
    pub total_count: usize,
}

/// Ordering applied to search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Similarity order as returned by the vector store
    #[default]
    Similarity,
    /// Modification time, newest first. A re-ordering of the selected
    /// top-k set, not a different selection.
    Recency,
}

/// Search parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Requested result count; resolved against the configured limits
    pub limit: Option<usize>,
    /// Result ordering
    pub sort: SortOrder,
}

impl SearchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// One ranked search result with catalog metadata joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Absolute path of the matched image
    pub path: String,
    /// Inner-product similarity score
    pub score: f32,
    /// Modification time recorded at index time (unix seconds)
    pub mtime: i64,
    /// File size recorded at index time (bytes)
    pub size: u64,
}

/// Index statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of indexed images
    pub vector_count: usize,
    /// Embedding dimension, None while the index is empty
    pub dimension: Option<usize>,
    /// Combined on-disk size of the persisted index files
    pub size_bytes: u64,
}

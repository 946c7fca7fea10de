//! Index manager: the API surface the transport layer calls.
//!
//! Owns a registry of per-folder handles keyed by canonicalized path,
//! the injected embedding provider, and the per-folder comment stores.
//! Build staging follows one rule: a batch is appended to a staged
//! state, persisted, and only then published, so concurrent searches
//! always run against the last fully-persisted snapshot.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use snapseek_annotations::{AnnotatedImage, AnnotationStore, Comment};
use snapseek_catalog::CatalogEntry;
use snapseek_embeddings::{Embedding, EmbeddingProvider};

use crate::config::IndexConfig;
use crate::error::IndexError;
use crate::handle::FolderIndex;
use crate::scan::scan_images;
use crate::state::{IndexState, CATALOG_FILE, COMMENTS_FILE, VECTORS_FILE};
use crate::types::{IndexStats, IndexSummary, SearchOptions, SearchResult, SortOrder};

/// Manages folder indexes: incremental builds, persistence, and search.
///
/// One instance serves all folders; the embedding provider handle is
/// injected once at construction and shared.
pub struct IndexManager {
    provider: Arc<dyn EmbeddingProvider>,
    config: IndexConfig,
    handles: Mutex<HashMap<PathBuf, Arc<FolderIndex>>>,
    annotations: Mutex<HashMap<PathBuf, Arc<Mutex<AnnotationStore>>>>,
}

impl IndexManager {
    /// Create a manager with the given provider and configuration.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: IndexConfig) -> Self {
        Self {
            provider,
            config,
            handles: Mutex::new(HashMap::new()),
            annotations: Mutex::new(HashMap::new()),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Scan `folder`, embed files not yet indexed, and append them to
    /// the persisted index.
    ///
    /// Files the provider fails on are skipped with a warning; each
    /// batch becomes visible to searches only after it is persisted. A
    /// second concurrent call for the same folder gets
    /// [`IndexError::BuildInProgress`].
    ///
    /// The diff is by path presence only: a file already cataloged is
    /// never re-embedded, even if its content changed since.
    pub fn build_or_update(&self, folder: &Path) -> Result<IndexSummary, IndexError> {
        let folder = self.validate_folder(folder)?;
        let handle = self.handle(&folder)?;

        let _guard = match handle.build_lock.try_lock() {
            Ok(guard) => guard,
            Err(std::sync::TryLockError::WouldBlock) => return Err(IndexError::BuildInProgress),
            Err(std::sync::TryLockError::Poisoned(e)) => {
                return Err(IndexError::State(format!("build lock poisoned: {e}")))
            }
        };

        let mut current = match handle.ensure_loaded()? {
            Some(state) => state,
            None => Arc::new(IndexState::empty()),
        };

        if let Some(dimension) = current.vectors.dimension() {
            if dimension != self.provider.dimension() {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: self.provider.dimension(),
                });
            }
        }

        let scanned = scan_images(&folder)?;
        if scanned.is_empty() && current.is_empty() {
            return Err(IndexError::NoImagesFound);
        }

        let new_paths = current.catalog.diff(&scanned);
        if new_paths.is_empty() {
            debug!(folder = ?folder, total = current.len(), "Index already up to date");
            return Ok(IndexSummary {
                added_count: 0,
                total_count: current.len(),
            });
        }

        info!(folder = ?folder, new = new_paths.len(), "Indexing new images");
        let mut added = 0;

        for chunk in new_paths.chunks(self.config.batch_size) {
            let refs: Vec<&Path> = chunk.iter().map(|p| p.as_path()).collect();
            let embeddings = self.provider.embed_image_batch(&refs);

            let mut vectors = Vec::new();
            let mut entries = Vec::new();
            for (path, result) in chunk.iter().zip(embeddings) {
                let embedding = match result {
                    Ok(embedding) => embedding,
                    Err(e) => {
                        warn!(path = ?path, error = %e, "Skipping image: embedding failed");
                        continue;
                    }
                };
                let meta = match std::fs::metadata(path) {
                    Ok(meta) => meta,
                    Err(e) => {
                        warn!(path = ?path, error = %e, "Skipping image: stat failed");
                        continue;
                    }
                };
                vectors.push(embedding);
                entries.push(CatalogEntry::new(
                    path.to_string_lossy(),
                    file_mtime(&meta),
                    meta.len(),
                ));
            }

            if vectors.is_empty() {
                continue;
            }

            // Stage, persist, then publish: one unit per batch.
            let mut staged = (*current).clone();
            staged.vectors.add(&vectors)?;
            for entry in entries {
                staged.catalog.append(entry)?;
            }

            let staged = Arc::new(staged);
            staged.persist(&handle.sidecar)?;
            handle.swap(Arc::clone(&staged))?;

            added += vectors.len();
            debug!(
                folder = ?folder,
                batch = vectors.len(),
                total = staged.len(),
                "Batch committed"
            );
            current = staged;
        }

        if added == 0 && current.is_empty() {
            // Every candidate file failed to embed on a first build;
            // nothing was persisted.
            return Err(IndexError::NoImagesFound);
        }

        info!(
            folder = ?folder,
            added = added,
            total = current.len(),
            "Index build complete"
        );
        Ok(IndexSummary {
            added_count: added,
            total_count: current.len(),
        })
    }

    /// Search a folder's index with an already-embedded query vector.
    ///
    /// The requested limit is resolved against the configured bounds;
    /// a limit larger than the index simply returns everything.
    pub fn search(
        &self,
        folder: &Path,
        query: &Embedding,
        opts: SearchOptions,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let folder = self.validate_folder(folder)?;
        let handle = self.handle(&folder)?;
        let state = handle.ensure_loaded()?.ok_or(IndexError::NotIndexed)?;

        if let Some(dimension) = state.vectors.dimension() {
            if query.dimension() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: query.dimension(),
                });
            }
        }

        let limit = self.config.limits.resolve(opts.limit);
        let hits = state.vectors.search(query, limit)?;

        let mut results: Vec<SearchResult> = hits
            .iter()
            .filter_map(|hit| {
                // Positions always resolve under the append-only
                // invariant; checked anyway so a bad index degrades to
                // fewer results instead of a failure.
                state.catalog.by_position(hit.position).map(|entry| SearchResult {
                    path: entry.path.clone(),
                    score: hit.score,
                    mtime: entry.mtime,
                    size: entry.size,
                })
            })
            .collect();

        apply_sort(&mut results, opts.sort);

        debug!(folder = ?folder, hits = results.len(), "Search complete");
        Ok(results)
    }

    /// Search with a natural-language description.
    pub fn search_text(
        &self,
        folder: &Path,
        query: &str,
        opts: SearchOptions,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let embedding = self.provider.embed_text(query)?;
        self.search(folder, &embedding, opts)
    }

    /// Search with a reference image.
    pub fn search_image(
        &self,
        folder: &Path,
        image: &Path,
        opts: SearchOptions,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let embedding = self.provider.embed_image(image)?;
        self.search(folder, &embedding, opts)
    }

    /// True iff a persisted index exists for the folder. Does not load
    /// the index.
    pub fn is_indexed(&self, folder: &Path) -> bool {
        match self.validate_folder(folder) {
            Ok(folder) => IndexState::is_persisted(&folder.join(&self.config.sidecar_dir)),
            Err(_) => false,
        }
    }

    /// Statistics for a folder's index.
    pub fn stats(&self, folder: &Path) -> Result<IndexStats, IndexError> {
        let folder = self.validate_folder(folder)?;
        let handle = self.handle(&folder)?;
        let state = handle.ensure_loaded()?.ok_or(IndexError::NotIndexed)?;

        let size_bytes = [VECTORS_FILE, CATALOG_FILE]
            .iter()
            .filter_map(|name| std::fs::metadata(handle.sidecar.join(name)).ok())
            .map(|meta| meta.len())
            .sum();

        Ok(IndexStats {
            vector_count: state.len(),
            dimension: state.vectors.dimension(),
            size_bytes,
        })
    }

    /// Append a comment to an image and return its updated sequence.
    pub fn add_comment(
        &self,
        folder: &Path,
        image_path: &str,
        text: &str,
    ) -> Result<Vec<Comment>, IndexError> {
        let folder = self.validate_folder(folder)?;
        let store = self.annotation_store(&folder)?;
        let mut store = store
            .lock()
            .map_err(|e| IndexError::State(format!("comment store lock poisoned: {e}")))?;
        Ok(store.append(image_path, text)?)
    }

    /// Comments for one image, oldest first. Empty if none.
    pub fn comments(&self, folder: &Path, image_path: &str) -> Result<Vec<Comment>, IndexError> {
        let folder = self.validate_folder(folder)?;
        let store = self.annotation_store(&folder)?;
        let store = store
            .lock()
            .map_err(|e| IndexError::State(format!("comment store lock poisoned: {e}")))?;
        Ok(store.list(image_path))
    }

    /// Commented images joined against the folder's catalog, most
    /// recently commented first. Requires an indexed folder.
    pub fn annotated_images(&self, folder: &Path) -> Result<Vec<AnnotatedImage>, IndexError> {
        let folder = self.validate_folder(folder)?;
        let handle = self.handle(&folder)?;
        let state = handle.ensure_loaded()?.ok_or(IndexError::NotIndexed)?;

        let store = self.annotation_store(&folder)?;
        let store = store
            .lock()
            .map_err(|e| IndexError::State(format!("comment store lock poisoned: {e}")))?;

        let known: HashSet<&str> = state.catalog.paths().collect();
        Ok(store.list_annotated(&known))
    }

    /// Canonicalize and validate a folder path.
    fn validate_folder(&self, folder: &Path) -> Result<PathBuf, IndexError> {
        let canonical = std::fs::canonicalize(folder)
            .map_err(|_| IndexError::InvalidFolder(folder.to_path_buf()))?;
        if !canonical.is_dir() {
            return Err(IndexError::InvalidFolder(folder.to_path_buf()));
        }
        if let Some(root) = &self.config.allowed_root {
            let root = std::fs::canonicalize(root)
                .map_err(|_| IndexError::InvalidFolder(folder.to_path_buf()))?;
            if !canonical.starts_with(&root) {
                return Err(IndexError::InvalidFolder(folder.to_path_buf()));
            }
        }
        Ok(canonical)
    }

    /// Get or create the handle for a canonicalized folder.
    fn handle(&self, canonical: &Path) -> Result<Arc<FolderIndex>, IndexError> {
        let mut handles = self
            .handles
            .lock()
            .map_err(|e| IndexError::State(format!("registry lock poisoned: {e}")))?;
        Ok(Arc::clone(handles.entry(canonical.to_path_buf()).or_insert_with(
            || Arc::new(FolderIndex::new(canonical.join(&self.config.sidecar_dir))),
        )))
    }

    /// Get or open the comment store for a canonicalized folder.
    fn annotation_store(&self, canonical: &Path) -> Result<Arc<Mutex<AnnotationStore>>, IndexError> {
        let mut stores = self
            .annotations
            .lock()
            .map_err(|e| IndexError::State(format!("comment registry lock poisoned: {e}")))?;
        Ok(Arc::clone(stores.entry(canonical.to_path_buf()).or_insert_with(
            || {
                let file = canonical.join(&self.config.sidecar_dir).join(COMMENTS_FILE);
                Arc::new(Mutex::new(AnnotationStore::open(
                    file,
                    self.config.max_comment_len,
                )))
            },
        )))
    }
}

/// Re-order an already-selected result set.
fn apply_sort(results: &mut [SearchResult], sort: SortOrder) {
    if sort == SortOrder::Recency {
        results.sort_by(|a, b| b.mtime.cmp(&a.mtime));
    }
}

/// Modification time as unix seconds, 0 when the platform cannot
/// report one.
fn file_mtime(meta: &std::fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

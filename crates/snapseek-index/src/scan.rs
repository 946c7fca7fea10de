//! Folder scanning.
//!
//! Non-recursive: only files directly inside the folder are indexed,
//! matching the one-folder-one-index model.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Image extensions the scanner accepts, compared case-insensitively.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["bmp", "jpeg", "jpg", "png", "webp"];

/// Check whether a path has a supported image extension.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// List the supported image files directly inside `folder`, sorted by
/// path. Sorting makes the scan order stable across runs and platforms,
/// which the catalog diff and append order depend on.
pub fn scan_images(folder: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    debug!(folder = ?folder, found = paths.len(), "Scanned folder");
    Ok(paths)
}

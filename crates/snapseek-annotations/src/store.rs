//! Comment log storage.
//!
//! Persisted as one JSON file per folder: a map from image path to an
//! ordered list of `"[YYYY-MM-DD HH:MM:SS] text"` strings. The bracket
//! prefix is the wire format; in memory the timestamp is parsed out so
//! sorting never depends on string order.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::AnnotationError;

/// Timestamp format used in the persisted comment prefix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One comment on an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// When the comment was made. None only for legacy persisted
    /// entries whose prefix could not be parsed.
    pub timestamp: Option<NaiveDateTime>,
    /// The comment text, without the timestamp prefix
    pub text: String,
}

impl Comment {
    /// Create a comment stamped with the given time.
    pub fn stamped(text: impl Into<String>, at: NaiveDateTime) -> Self {
        Self {
            timestamp: Some(at),
            text: text.into(),
        }
    }

    /// Render to the persisted `"[timestamp] text"` form.
    pub fn render(&self) -> String {
        match self.timestamp {
            Some(ts) => format!("[{}] {}", ts.format(TIMESTAMP_FORMAT), self.text),
            None => self.text.clone(),
        }
    }

    /// Parse a persisted comment string. An entry without a parseable
    /// `[timestamp]` prefix is kept verbatim with no timestamp.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix('[') {
            if let Some((stamp, text)) = rest.split_once("] ") {
                if let Ok(ts) = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT) {
                    return Self {
                        timestamp: Some(ts),
                        text: text.to_string(),
                    };
                }
            }
        }
        Self {
            timestamp: None,
            text: raw.to_string(),
        }
    }
}

/// Summary row for the commented-images listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedImage {
    /// Image path the comments are attached to
    pub path: String,
    /// Number of comments on this image
    pub count: usize,
    /// The most recently appended comment
    pub latest: Comment,
}

/// Append-only comment log for one folder.
pub struct AnnotationStore {
    file: PathBuf,
    max_comment_len: usize,
    log: BTreeMap<String, Vec<Comment>>,
}

impl AnnotationStore {
    /// Open the log file, or start empty if it is missing.
    ///
    /// Comments are non-critical, so a damaged file is logged and
    /// treated as empty rather than failing the caller.
    pub fn open(file: impl Into<PathBuf>, max_comment_len: usize) -> Self {
        let file = file.into();
        let log = match std::fs::read_to_string(&file) {
            Ok(raw) => match serde_json::from_str::<BTreeMap<String, Vec<String>>>(&raw) {
                Ok(parsed) => parsed
                    .into_iter()
                    .map(|(path, lines)| {
                        (path, lines.iter().map(|l| Comment::parse(l)).collect())
                    })
                    .collect(),
                Err(e) => {
                    warn!(file = ?file, error = %e, "Malformed comment log, starting empty");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(file = ?file, error = %e, "Unreadable comment log, starting empty");
                BTreeMap::new()
            }
        };

        debug!(file = ?file, paths = log.len(), "Opened comment log");
        Self {
            file,
            max_comment_len,
            log,
        }
    }

    /// Number of paths that have at least one comment.
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Check if the log has no comments at all.
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Append a comment to an image path, persist the log, and return
    /// the updated sequence for that path.
    pub fn append(&mut self, path: &str, text: &str) -> Result<Vec<Comment>, AnnotationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnnotationError::EmptyComment);
        }
        if text.chars().count() > self.max_comment_len {
            return Err(AnnotationError::CommentTooLong {
                max: self.max_comment_len,
            });
        }

        let comment = Comment::stamped(text, chrono::Local::now().naive_local());
        self.log.entry(path.to_string()).or_default().push(comment);
        self.persist()?;

        info!(path = %path, "Appended comment");
        Ok(self.list(path))
    }

    /// Comments for one path, in insertion order. Empty if none.
    pub fn list(&self, path: &str) -> Vec<Comment> {
        self.log.get(path).cloned().unwrap_or_default()
    }

    /// Commented images restricted to `known_paths`, sorted by the
    /// parsed timestamp of each path's latest comment, newest first.
    /// Entries with no parseable timestamp sort last.
    pub fn list_annotated(&self, known_paths: &HashSet<&str>) -> Vec<AnnotatedImage> {
        let mut rows: Vec<AnnotatedImage> = self
            .log
            .iter()
            .filter(|(path, comments)| {
                known_paths.contains(path.as_str()) && !comments.is_empty()
            })
            .map(|(path, comments)| AnnotatedImage {
                path: path.clone(),
                count: comments.len(),
                latest: comments[comments.len() - 1].clone(),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.latest
                .timestamp
                .cmp(&a.latest.timestamp)
                .then_with(|| a.path.cmp(&b.path))
        });
        rows
    }

    /// Write the whole log out, replacing the file atomically.
    fn persist(&self) -> Result<(), AnnotationError> {
        let rendered: BTreeMap<&str, Vec<String>> = self
            .log
            .iter()
            .map(|(path, comments)| {
                (
                    path.as_str(),
                    comments.iter().map(Comment::render).collect(),
                )
            })
            .collect();

        let json = serde_json::to_string_pretty(&rendered)
            .map_err(|e| AnnotationError::Serialization(e.to_string()))?;

        let dir = self.file.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let tmp = NamedTempFile::new_in(dir)?;
        std::fs::write(tmp.path(), json)?;
        tmp.persist(&self.file)
            .map_err(|e| AnnotationError::Io(e.error))?;
        Ok(())
    }
}

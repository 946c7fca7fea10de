//! # snapseek-annotations
//!
//! Path-keyed comment log for snapseek.
//!
//! Comments are free-text notes a user attaches to an image. The log is
//! independent of the index lifecycle: a comment may outlive the image's
//! index entry and vice versa, and the two are only joined by path at
//! query time.
//!
//! ## Features
//! - Timestamped, append-only comment sequences per image path
//! - Whole-log JSON persistence with atomic replace
//! - Lenient load: a missing or damaged log reads as empty

pub mod error;
pub mod store;

pub use error::AnnotationError;
pub use store::{AnnotatedImage, AnnotationStore, Comment};

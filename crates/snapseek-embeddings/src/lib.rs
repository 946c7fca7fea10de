//! # snapseek-embeddings
//!
//! Embedding provider contract for snapseek.
//!
//! This crate defines the seam between the index core and whatever model
//! produces image/text embeddings (CLIP or similar). The model itself is
//! loaded and owned by the composing process; the index manager only sees
//! the [`EmbeddingProvider`] trait.
//!
//! ## Features
//! - `Embedding` value type, unit-normalized at construction
//! - Image and text embedding through one provider handle
//! - Per-item batch results so one bad file never fails a batch

pub mod error;
pub mod model;

pub use error::EmbeddingError;
pub use model::{Embedding, EmbeddingProvider, ProviderInfo};

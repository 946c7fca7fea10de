//! # snapseek-vector
//!
//! Exact inner-product vector store for snapseek.
//!
//! Stores embeddings as a flat, append-only f32 buffer and answers
//! top-k queries with a brute-force scan. On unit-normalized vectors the
//! inner product equals cosine similarity, so callers must submit
//! normalized vectors (see `snapseek_embeddings::Embedding::new`).
//!
//! ## Features
//! - Append-only flat storage, dimension fixed by the first add
//! - Exact O(N*D) search, deterministic tie-breaking by position
//! - Bincode persistence with atomic replace and load-time validation
//!
//! N is bounded by a single folder's image count, which keeps the exact
//! scan well inside interactive latency. A caller needing much larger N
//! can substitute an approximate index behind the same contract.

pub mod error;
pub mod store;

pub use error::VectorError;
pub use store::{FlatStore, SearchHit};

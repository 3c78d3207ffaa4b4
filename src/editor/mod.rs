//! In-memory document model.
//!
//! Provides a rope-backed text buffer held in the canonical encoding,
//! with exact and approximate translation between character positions
//! and byte offsets.

mod buffer;

pub use buffer::{Document, LineEnding, canonicalize, canonicalize_bytes};

//! Embedded persistent vector store.
//!
//! A store is a directory holding one SQLite database (`vectors.sqlite3`).
//! Inside it, named collections group records made of an id, a vector, a
//! metadata map and an optional source document.
//!
//! # Submodules
//!
//! - [`metadata`] - Typed, optional-field record metadata
//! - [`schema`] - Database schema definitions
//! - [`sqlite`] - The store itself

pub mod metadata;
pub mod schema;
pub mod sqlite;

pub use metadata::{Metadata, MetadataValue};
pub use sqlite::{Collection, NewRecord, STORE_FILE, StoredRecord, VectorStore};

/// A vector BLOB whose length is not a whole number of f32 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Malformed vector: {len} bytes is not a whole number of f32 values")]
pub struct MalformedVector {
    pub len: usize,
}

/// Encode a vector as little-endian f32 bytes.
#[must_use]
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode little-endian f32 bytes back into a vector.
///
/// # Errors
///
/// Returns `MalformedVector` if the length is not a multiple of 4.
pub fn decode_vector(blob: &[u8]) -> std::result::Result<Vec<f32>, MalformedVector> {
    if blob.len() % 4 != 0 {
        return Err(MalformedVector { len: blob.len() });
    }

    Ok(blob
        .chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect())
}

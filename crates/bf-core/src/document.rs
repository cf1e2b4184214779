// SPDX-License-Identifier: MIT OR Apache-2.0
//! An uploaded RAG source and its embedded chunks (§4.2).

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed embedding dimension (§4.2: "D = 768").
pub const EMBEDDING_DIM: usize = 768;

/// A user-uploaded document, deduplicated per-user by content hash.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    /// Unique identifier, stable across repeat uploads of identical content.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Original filename, used for extension-based text extraction.
    pub filename: String,
    /// Hex-encoded SHA-256 of the extracted plain text.
    pub content_hash: String,
    /// Upload time.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Construct a new document record.
    pub fn new(user_id: Uuid, filename: impl Into<String>, content_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            filename: filename.into(),
            content_hash: content_hash.into(),
            created_at: Utc::now(),
        }
    }
}

/// A contiguous text fragment of a [`Document`], paired with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Chunk {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning document.
    pub document_id: Uuid,
    /// Denormalized owner, so similarity search can filter by tenancy in
    /// one scan (§4.2 rationale).
    pub user_id: Uuid,
    /// Position of this chunk within the document, starting at 0.
    pub chunk_index: usize,
    /// The chunk's raw text.
    pub content: String,
    /// Fixed-dimension embedding vector.
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Construct a new chunk. Panics if `embedding.len() != EMBEDDING_DIM`,
    /// since a mis-dimensioned vector would silently corrupt similarity
    /// search — this is a programmer error, not a runtime condition.
    pub fn new(
        document_id: Uuid,
        user_id: Uuid,
        chunk_index: usize,
        content: impl Into<String>,
        embedding: Vec<f32>,
    ) -> Self {
        assert_eq!(
            embedding.len(),
            EMBEDDING_DIM,
            "embedding must have dimension {EMBEDDING_DIM}, got {}",
            embedding.len()
        );
        Self {
            id: Uuid::new_v4(),
            document_id,
            user_id,
            chunk_index,
            content: content.into(),
            embedding,
        }
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tenant-scoped document storage and cosine-similarity retrieval (§4.2).
//!
//! The nearest-neighbor search here is a plain linear scan over in-memory
//! chunks rather than an external vector index: the ambient stack carries
//! no vector-database client, and a scored scan is good enough at the
//! document counts a single project's context ever reaches.

use crate::chunk::{chunk_text, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::embed::{EmbeddingProvider, MAX_EMBED_BATCH};
use crate::extract::extract_text;
use bf_core::{Chunk, Document};
use bf_error::BfError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

/// Similarity floor below which a chunk is deemed irrelevant (§4.2).
pub const SIMILARITY_FLOOR: f32 = 0.3;

/// Default number of chunks returned per retrieval.
pub const DEFAULT_TOP_K: usize = 5;

/// An in-memory, tenant-scoped store of documents and their chunks.
#[derive(Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    chunks: Vec<Chunk>,
}

fn content_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a raw upload: extract text, dedupe by content hash, chunk,
    /// embed, and persist. Returns the existing [`Document`] unchanged if
    /// an identical upload for this user already exists (§4.2 idempotency).
    pub async fn ingest(
        &mut self,
        embedder: &dyn EmbeddingProvider,
        user_id: Uuid,
        filename: &str,
        raw: &[u8],
    ) -> Result<Document, BfError> {
        let text = extract_text(filename, raw)?;
        let hash = content_hash(&text);

        if let Some(existing) = self
            .documents
            .iter()
            .find(|d| d.user_id == user_id && d.content_hash == hash)
        {
            tracing::info!(target: "backforge.retrieval", filename, "duplicate upload, reusing document");
            return Ok(existing.clone());
        }

        let document = Document::new(user_id, filename, hash);
        let pieces = chunk_text(&text, DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP);

        for batch_start in (0..pieces.len()).step_by(MAX_EMBED_BATCH) {
            let batch_end = (batch_start + MAX_EMBED_BATCH).min(pieces.len());
            let batch = &pieces[batch_start..batch_end];
            let embeddings = embedder.embed_batch(batch).await?;
            for (offset, (text, embedding)) in batch.iter().zip(embeddings).enumerate() {
                self.chunks.push(Chunk::new(
                    document.id,
                    user_id,
                    batch_start + offset,
                    text.clone(),
                    embedding,
                ));
            }
        }

        tracing::info!(
            target: "backforge.retrieval",
            filename,
            chunks = pieces.len(),
            "stored document"
        );
        self.documents.push(document.clone());
        Ok(document)
    }

    /// Embed `query` and return the top-K chunks for `user_id` by cosine
    /// similarity, discarding anything at or below [`SIMILARITY_FLOOR`],
    /// concatenated with a separator (§4.2). Empty if nothing survives.
    pub async fn retrieve_context(
        &self,
        embedder: &dyn EmbeddingProvider,
        user_id: Uuid,
        query: &str,
        top_k: usize,
    ) -> Result<String, BfError> {
        let user_chunks: Vec<&Chunk> = self.chunks.iter().filter(|c| c.user_id == user_id).collect();
        if user_chunks.is_empty() {
            return Ok(String::new());
        }

        let query_embedding = embedder
            .embed_batch(std::slice::from_ref(&query.to_string()))
            .await?
            .into_iter()
            .next()
            .unwrap_or_default();

        let mut scored: Vec<(f32, &Chunk)> = user_chunks
            .into_iter()
            .map(|c| (cosine_similarity(&query_embedding, &c.embedding), c))
            .filter(|(score, _)| *score > SIMILARITY_FLOOR)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(_, c)| c.content.clone())
            .collect::<Vec<_>>()
            .join("\n---\n"))
    }

    /// Number of documents stored for a user.
    pub fn document_count(&self, user_id: Uuid) -> usize {
        self.documents.iter().filter(|d| d.user_id == user_id).count()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|y| y * y).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

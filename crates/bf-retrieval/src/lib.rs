// SPDX-License-Identifier: MIT OR Apache-2.0
//! Document ingestion, chunking, embedding, and tenant-scoped retrieval
//! for the Backforge context retriever (C2, §4.2).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod chunk;
mod embed;
mod extract;
mod store;

pub use chunk::{chunk_text, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use embed::{EmbeddingProvider, MockEmbeddingProvider, MAX_EMBED_BATCH};
pub use extract::{extract_text, MAX_DOCUMENT_BYTES};
pub use store::{DocumentStore, DEFAULT_TOP_K, SIMILARITY_FLOOR};

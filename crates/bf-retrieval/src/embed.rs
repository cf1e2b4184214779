// SPDX-License-Identifier: MIT OR Apache-2.0
//! The embedding provider contract (§6) and a deterministic mock.

use async_trait::async_trait;
use bf_core::EMBEDDING_DIM;
use bf_error::BfError;

/// Maximum chunks embedded in a single provider call (§4.2).
pub const MAX_EMBED_BATCH: usize = 100;

/// A text-to-vector embedding backend.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts, returning one `EMBEDDING_DIM`-length vector
    /// per input, in the same order. Callers are responsible for splitting
    /// batches larger than [`MAX_EMBED_BATCH`].
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BfError>;
}

/// A deterministic embedding provider for tests: hashes each text into a
/// reproducible pseudo-embedding rather than calling a real model.
#[derive(Debug, Default)]
pub struct MockEmbeddingProvider;

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, BfError> {
        Ok(texts.iter().map(|t| deterministic_embedding(t)).collect())
    }
}

fn deterministic_embedding(text: &str) -> Vec<f32> {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    (0..EMBEDDING_DIM)
        .map(|i| {
            let byte = digest[i % digest.len()];
            (byte as f32 / 255.0) - 0.5
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embeddings_have_the_fixed_dimension() {
        let provider = MockEmbeddingProvider;
        let out = provider
            .embed_batch(&["hello".to_string(), "world".to_string()])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
        for v in out {
            assert_eq!(v.len(), EMBEDDING_DIM);
        }
    }

    #[tokio::test]
    async fn mock_embeddings_are_deterministic() {
        let provider = MockEmbeddingProvider;
        let a = provider.embed_batch(&["same text".to_string()]).await.unwrap();
        let b = provider.embed_batch(&["same text".to_string()]).await.unwrap();
        assert_eq!(a, b);
    }
}

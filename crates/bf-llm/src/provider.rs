// SPDX-License-Identifier: MIT OR Apache-2.0
//! The LLM provider contract and its normalized error taxonomy (§4.4, §6).

use async_trait::async_trait;
use std::fmt;

/// Errors a provider call can normalize to (§4.4).
#[derive(Debug, Clone, PartialEq)]
pub enum LlmError {
    /// HTTP-429-like or provider-specific "resource exhausted" signal.
    QuotaExhausted,
    /// Timeout or 5xx; recovered locally with backoff.
    NetworkTransient(String),
    /// The model returned unparseable or non-schema-conforming output.
    SchemaInvalid(String),
    /// Auth, permission, or malformed-request failure; not retryable.
    Terminal(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::QuotaExhausted => write!(f, "quota exhausted"),
            LlmError::NetworkTransient(msg) => write!(f, "transient network error: {msg}"),
            LlmError::SchemaInvalid(msg) => write!(f, "invalid schema response: {msg}"),
            LlmError::Terminal(msg) => write!(f, "terminal provider error: {msg}"),
        }
    }
}

impl std::error::Error for LlmError {}

/// A single request to a provider (§6: `generate(system, user, schema, temp, max_tokens)`).
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// System prompt.
    pub system: String,
    /// User prompt.
    pub user: String,
    /// JSON schema the response must conform to.
    pub schema: serde_json::Value,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// A pluggable LLM backend (§4.4, §6).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for one model, returning raw text on success.
    async fn generate(&self, model_id: &str, request: &GenerateRequest) -> Result<String, LlmError>;
}

/// A scripted provider for tests: returns a fixed response for a model, or
/// the configured failure, without any network I/O.
#[derive(Debug, Default)]
pub struct MockLlmProvider {
    /// Per-model scripted outcomes, consumed in order as a queue.
    pub scripts: std::sync::Mutex<std::collections::HashMap<String, std::collections::VecDeque<Result<String, LlmError>>>>,
}

impl MockLlmProvider {
    /// Create a provider with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the given model id.
    pub fn push(&self, model_id: &str, outcome: Result<String, LlmError>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(model_id.to_string())
            .or_default()
            .push_back(outcome);
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate(&self, model_id: &str, _request: &GenerateRequest) -> Result<String, LlmError> {
        self.scripts
            .lock()
            .unwrap()
            .get_mut(model_id)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Err(LlmError::Terminal(format!("no script for model {model_id}"))))
    }
}

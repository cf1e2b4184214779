// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fallback-chain-walking call dispatch (§4.4 algorithm).

use crate::provider::{GenerateRequest, LlmError, LlmProvider};
use crate::registry::fallback_chain;
use std::time::Duration;

/// Per-model API attempts before giving up on that model (§4.4 step 2).
const ATTEMPTS_PER_MODEL: u32 = 3;

/// Call `provider` against the fallback chain rooted at `starting_model_id`,
/// per §4.4's algorithm:
///
/// 1. Compute the fallback chain.
/// 2. For each model, retry up to [`ATTEMPTS_PER_MODEL`] times: on
///    `NetworkTransient`, back off exponentially (`2^attempt` seconds) and
///    retry the same model; on `QuotaExhausted`, stop retrying this model
///    and advance to the next one in the chain.
/// 3. Return the first success.
/// 4. If the chain is exhausted, surface the last error observed.
pub async fn call_with_fallback(
    provider: &dyn LlmProvider,
    starting_model_id: &str,
    request: &GenerateRequest,
) -> Result<String, LlmError> {
    let chain = fallback_chain(starting_model_id);
    if chain.is_empty() {
        return Err(LlmError::Terminal(format!(
            "unknown starting model: {starting_model_id}"
        )));
    }

    let mut last_error = LlmError::Terminal("fallback chain was empty".into());

    for model_id in chain {
        match call_single_model(provider, model_id, request).await {
            Ok(text) => return Ok(text),
            Err(err @ (LlmError::SchemaInvalid(_) | LlmError::Terminal(_))) => return Err(err),
            Err(err) => last_error = err,
        }
    }

    Err(last_error)
}

/// Call one model with up to [`ATTEMPTS_PER_MODEL`] attempts, backing off
/// exponentially on `NetworkTransient` and giving up immediately (without
/// retrying) on `QuotaExhausted` — the per-model half of the §4.4
/// algorithm, exposed so callers that need their own retry policy around
/// it (e.g. the spec agent's re-prompt-on-invalid-output loop, §4.3) can
/// drive the fallback chain themselves.
pub async fn call_single_model(
    provider: &dyn LlmProvider,
    model_id: &str,
    request: &GenerateRequest,
) -> Result<String, LlmError> {
    let mut last_error = LlmError::Terminal(format!("no attempts made for {model_id}"));

    for attempt in 0..ATTEMPTS_PER_MODEL {
        match provider.generate(model_id, request).await {
            Ok(text) => return Ok(text),
            Err(LlmError::NetworkTransient(msg)) => {
                last_error = LlmError::NetworkTransient(msg);
                if attempt + 1 < ATTEMPTS_PER_MODEL {
                    let backoff = Duration::from_secs(2u64.pow(attempt + 1));
                    tracing::warn!(
                        target: "backforge.llm",
                        model_id,
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        "transient network error, backing off"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
            Err(LlmError::QuotaExhausted) => {
                tracing::info!(target: "backforge.llm", model_id, "quota exhausted");
                return Err(LlmError::QuotaExhausted);
            }
            Err(err @ (LlmError::SchemaInvalid(_) | LlmError::Terminal(_))) => {
                return Err(err);
            }
        }
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockLlmProvider;

    fn request() -> GenerateRequest {
        GenerateRequest {
            system: "sys".into(),
            user: "user".into(),
            schema: serde_json::json!({}),
            temperature: 0.2,
            max_tokens: 1024,
        }
    }

    #[tokio::test]
    async fn succeeds_on_first_model() {
        let provider = MockLlmProvider::new();
        provider.push("gemini-2.0-flash", Ok("hello".into()));
        let out = call_with_fallback(&provider, "gemini-2.0-flash", &request())
            .await
            .unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn quota_exhaustion_advances_to_next_model() {
        let provider = MockLlmProvider::new();
        provider.push("gemini-2.0-flash", Err(LlmError::QuotaExhausted));
        provider.push("gemini-2.5-flash", Ok("from flash 2.5".into()));
        let out = call_with_fallback(&provider, "gemini-2.0-flash", &request())
            .await
            .unwrap();
        assert_eq!(out, "from flash 2.5");
    }

    #[tokio::test]
    async fn schema_invalid_does_not_advance_the_chain() {
        let provider = MockLlmProvider::new();
        provider.push("gemini-2.0-flash", Err(LlmError::SchemaInvalid("bad json".into())));
        provider.push("gemini-2.5-flash", Ok("unreachable".into()));
        let err = call_with_fallback(&provider, "gemini-2.0-flash", &request())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::SchemaInvalid(_)));
    }

    #[tokio::test]
    async fn exhausted_chain_surfaces_last_error() {
        let provider = MockLlmProvider::new();
        provider.push("gemini-2.0-flash", Err(LlmError::QuotaExhausted));
        provider.push("gemini-2.5-flash", Err(LlmError::QuotaExhausted));
        provider.push("gemini-2.5-pro", Err(LlmError::QuotaExhausted));
        let err = call_with_fallback(&provider, "gemini-2.0-flash", &request())
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::QuotaExhausted);
    }

    #[tokio::test]
    async fn unknown_starting_model_is_terminal() {
        let provider = MockLlmProvider::new();
        let err = call_with_fallback(&provider, "not-a-model", &request())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Terminal(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_retries_same_model_before_advancing() {
        let provider = MockLlmProvider::new();
        provider.push(
            "gemini-2.0-flash",
            Err(LlmError::NetworkTransient("timeout".into())),
        );
        provider.push("gemini-2.0-flash", Ok("recovered".into()));
        let out = call_with_fallback(&provider, "gemini-2.0-flash", &request())
            .await
            .unwrap();
        assert_eq!(out, "recovered");
    }
}

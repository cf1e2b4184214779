// SPDX-License-Identifier: MIT OR Apache-2.0
//! The Prompt→Spec agent protocol (C3, §4.3).

use crate::prompt::{retry_message, strip_markdown_fences, system_instruction, user_message};
use bf_core::Spec;
use bf_error::{BfError, ErrorCode};
use bf_llm::{call_single_model, fallback_chain, GenerateRequest, LlmError, LlmProvider, DEFAULT_MODEL};

/// Re-prompt attempts on invalid output, per model (§4.3 step 6: "default 2").
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Temperature the spec agent calls providers with (§4.3 step 3).
pub const SPEC_AGENT_TEMPERATURE: f32 = 0.1;

const MAX_TOKENS: u32 = 8192;

/// Generate a validated [`Spec`] from a natural-language prompt, walking
/// the model fallback chain and re-prompting on invalid output (§4.3).
///
/// Returns the validated spec and the id of the model that produced it.
pub async fn generate_spec_from_prompt(
    provider: &dyn LlmProvider,
    prompt: &str,
    starting_model_id: Option<&str>,
    context: Option<&str>,
    prior_messages: &[(String, String)],
    max_retries: u32,
) -> Result<(Spec, String), BfError> {
    let start = starting_model_id.unwrap_or(DEFAULT_MODEL);
    let chain = fallback_chain(start);
    if chain.is_empty() {
        return Err(BfError::new(
            ErrorCode::AllModelsExhausted,
            format!("unknown starting model: {start}"),
        ));
    }

    let system = system_instruction();
    let first_user_message = user_message(prompt, context, prior_messages);
    let mut last_error: Option<String> = None;

    for model_id in chain {
        let mut model_last_error: Option<String> = None;

        for attempt in 0..=max_retries {
            let user = match (&model_last_error, attempt) {
                (Some(err), _) if attempt > 0 => retry_message(prompt, err),
                _ => first_user_message.clone(),
            };

            let request = GenerateRequest {
                system: system.clone(),
                user,
                schema: serde_json::to_value(schemars::schema_for!(Spec))
                    .unwrap_or(serde_json::Value::Null),
                temperature: SPEC_AGENT_TEMPERATURE,
                max_tokens: MAX_TOKENS,
            };

            match call_single_model(provider, model_id, &request).await {
                Ok(raw) => {
                    let cleaned = strip_markdown_fences(&raw);
                    match parse_and_validate(&cleaned) {
                        Ok(spec) => {
                            tracing::info!(
                                target: "backforge.spec_agent",
                                model_id,
                                attempt,
                                "spec generated"
                            );
                            return Ok((spec, model_id.to_string()));
                        }
                        Err(reason) => {
                            tracing::warn!(
                                target: "backforge.spec_agent",
                                model_id,
                                attempt,
                                reason,
                                "invalid output, will re-prompt"
                            );
                            model_last_error = Some(reason);
                        }
                    }
                }
                Err(LlmError::QuotaExhausted) => {
                    tracing::info!(target: "backforge.spec_agent", model_id, "quota exhausted, falling back");
                    last_error = Some(LlmError::QuotaExhausted.to_string());
                    model_last_error = None;
                    break;
                }
                Err(err) => {
                    return Err(BfError::new(ErrorCode::SpecGenerationFailed, err.to_string())
                        .with_context("model_id", model_id));
                }
            }
        }

        if let Some(err) = model_last_error {
            last_error = Some(err);
        }
    }

    Err(BfError::new(
        ErrorCode::AllModelsExhausted,
        last_error.unwrap_or_else(|| "fallback chain exhausted".to_string()),
    ))
}

fn parse_and_validate(text: &str) -> Result<Spec, String> {
    let spec: Spec = serde_json::from_str(text).map_err(|e| e.to_string())?;
    spec.validate().map_err(|e| e.to_string())?;
    Ok(spec)
}

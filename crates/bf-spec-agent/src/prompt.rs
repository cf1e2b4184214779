// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-order prompt composition for the spec agent (§4.3 steps 1-2).

use bf_core::Spec;

/// Build the system instruction: full schema, allowed field types, and
/// §3's invariants stated as rules. Schema text is generated from the
/// same [`Spec`] type the pipeline validates against, so drift between
/// prompt and validator is impossible.
pub fn system_instruction() -> String {
    let schema = schemars::schema_for!(Spec);
    let schema_json =
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string());

    format!(
        "You are a backend specification generator.\n\n\
Your ONLY job is to convert a user's natural language description of a backend\n\
into a valid JSON object matching the schema below.\n\n\
RULES:\n\
1. Return ONLY valid JSON. No markdown, no explanation, no comments.\n\
2. Every entity MUST have exactly one non-nullable primary key field.\n\
3. Entity names MUST be PascalCase (e.g. \"Product\", \"OrderItem\").\n\
4. Table names MUST be snake_case and plural, and unique across entities.\n\
5. Field names MUST be snake_case and unique within an entity.\n\
6. Only these field types are allowed: string, integer, float, boolean, datetime, uuid, text.\n\
7. project_name must be lowercase, start with a letter, and use only letters, digits, and hyphens.\n\
8. token_expiry_minutes, if auth is enabled, must be between 1 and 1440.\n\n\
SCHEMA:\n{schema_json}\n\n\
Return ONLY the JSON object. Nothing else."
    )
}

/// Build the user message for the first attempt at a model: an optional
/// labeled context block, an optional labeled prior-conversation block,
/// then the prompt — in that fixed order so caching/fingerprinting is
/// stable (§4.3 step 2).
pub fn user_message(prompt: &str, context: Option<&str>, prior_messages: &[(String, String)]) -> String {
    let mut out = String::new();

    if let Some(context) = context.filter(|c| !c.is_empty()) {
        out.push_str("CONTEXT FROM UPLOADED DOCUMENTS:\n");
        out.push_str(context);
        out.push_str("\n\n");
    }

    if !prior_messages.is_empty() {
        out.push_str("PREVIOUS CONVERSATION HISTORY (FOR CONTEXT):\n");
        for (role, content) in prior_messages {
            out.push_str(&format!("[{}]: {}\n\n", role.to_uppercase(), content));
        }
    }

    out.push_str("USER REQUEST:\n");
    out.push_str(prompt);
    out
}

/// Build the re-prompt message for a retry after invalid output (§4.3 step 6).
pub fn retry_message(prompt: &str, last_error: &str) -> String {
    format!(
        "Your previous response was invalid JSON or did not match the schema.\n\
Error: {last_error}\n\n\
Please try again. Original request: {prompt}"
    )
}

/// Strip a leading/trailing markdown code fence if present (§4.3 step 4).
pub fn strip_markdown_fences(text: &str) -> String {
    let trimmed = text.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_orders_context_then_history_then_prompt() {
        let msg = user_message(
            "build a blog",
            Some("some doc content"),
            &[("user".into(), "hi".into())],
        );
        let context_pos = msg.find("CONTEXT FROM").unwrap();
        let history_pos = msg.find("PREVIOUS CONVERSATION").unwrap();
        let request_pos = msg.find("USER REQUEST").unwrap();
        assert!(context_pos < history_pos);
        assert!(history_pos < request_pos);
    }

    #[test]
    fn user_message_omits_empty_sections() {
        let msg = user_message("build a blog", None, &[]);
        assert!(!msg.contains("CONTEXT FROM"));
        assert!(!msg.contains("PREVIOUS CONVERSATION"));
        assert!(msg.contains("USER REQUEST"));
    }

    #[test]
    fn strips_triple_backtick_fence() {
        let wrapped = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_markdown_fences(wrapped), "{\"a\":1}");
    }

    #[test]
    fn leaves_unfenced_text_untouched() {
        assert_eq!(strip_markdown_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn system_instruction_embeds_the_schema() {
        let instruction = system_instruction();
        assert!(instruction.contains("project_name"));
        assert!(instruction.contains("entities"));
    }
}

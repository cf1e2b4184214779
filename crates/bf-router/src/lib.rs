// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deterministic intent classification (C1, §4.1).
//!
//! Classifies a user prompt into one of three intents using a fixed
//! cascade of regular-expression pattern sets, checked in priority
//! order. No LLM call is involved; the cascade is pure and total.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// What the pipeline should do with a prompt (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Return the user's existing project; no new generation.
    Retrieve,
    /// Start a new or from-scratch generation pipeline.
    Generate,
    /// Modify an existing spec based on thread history.
    Refine,
}

static RETRIEVE_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(where\s+is|give\s+me|send\s+me|show\s+me|get\s+me|download|my\s+project|my\s+api|my\s+app|my\s+backend|i\s+already|you\s+built|you\s+made|we\s+built|we\s+made|link\s+to|zip|artifact|re-?download|resend)\b",
    )
    .expect("RETRIEVE_PATTERNS is a fixed, valid regex")
});

static GENERATE_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(build|create|generate|make|scaffold|set\s+up|implement|write|new\s+(api|backend|project|app|service))\b",
    )
    .expect("GENERATE_PATTERNS is a fixed, valid regex")
});

static REFINE_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(add|remove|update|change|fix|modify|extend|rename|also|additionally|now\s+also|i\s+also\s+want|and\s+(add|remove|include)|include|exclude|make\s+it|turn\s+it)\b",
    )
    .expect("REFINE_PATTERNS is a fixed, valid regex")
});

/// Classify a prompt's intent (§4.1 priority order):
///
/// 1. No existing project ⇒ always `Generate`.
/// 2. Retrieve pattern match ⇒ `Retrieve`.
/// 3. History present and a refine pattern matches ⇒ `Refine`.
/// 4. Generate pattern matches ⇒ `Generate`.
/// 5. History present ⇒ default `Refine`.
/// 6. Otherwise ⇒ default `Generate`.
pub fn classify_intent(prompt: &str, has_existing_project: bool, has_history: bool) -> Intent {
    let prompt_lower = prompt.trim().to_lowercase();

    if !has_existing_project {
        tracing::info!(target: "backforge.router", "no existing project, routing GENERATE");
        return Intent::Generate;
    }

    if RETRIEVE_PATTERNS.is_match(&prompt_lower) {
        tracing::info!(target: "backforge.router", "matched RETRIEVE pattern");
        return Intent::Retrieve;
    }

    if has_history && REFINE_PATTERNS.is_match(&prompt_lower) {
        tracing::info!(target: "backforge.router", "history + REFINE pattern matched");
        return Intent::Refine;
    }

    if GENERATE_PATTERNS.is_match(&prompt_lower) {
        tracing::info!(target: "backforge.router", "matched GENERATE pattern");
        return Intent::Generate;
    }

    if has_history {
        tracing::info!(target: "backforge.router", "no pattern matched, history present, defaulting REFINE");
        Intent::Refine
    } else {
        tracing::info!(target: "backforge.router", "no pattern matched, defaulting GENERATE");
        Intent::Generate
    }
}

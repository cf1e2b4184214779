// SPDX-License-Identifier: MIT OR Apache-2.0
//! Coerces an LLM into producing a [`bf_core::Spec`] that passes
//! structural validation (C3, §4.3).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod agent;
mod prompt;

pub use agent::{generate_spec_from_prompt, DEFAULT_MAX_RETRIES, SPEC_AGENT_TEMPERATURE};
pub use prompt::{retry_message, strip_markdown_fences, system_instruction, user_message};

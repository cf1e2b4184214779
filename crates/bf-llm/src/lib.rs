// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model registry and fallback-chain call routing for the Backforge LLM
//! provider router (C4, §4.4).

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod call;
mod provider;
mod registry;

pub use call::{call_single_model, call_with_fallback};
pub use provider::{GenerateRequest, LlmError, LlmProvider, MockLlmProvider};
pub use registry::{fallback_chain, get_model, list_models, ModelInfo, DEFAULT_MODEL};

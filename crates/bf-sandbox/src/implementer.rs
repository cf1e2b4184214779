// SPDX-License-Identifier: MIT OR Apache-2.0
//! The implementer collaborator contract driven by the repair loop (§4.7).

use async_trait::async_trait;
use bf_core::{PatchRequest, Spec};
use bf_error::BfError;
use std::collections::HashMap;

/// Regenerates specific files in response to patch requests.
#[async_trait]
pub trait Implementer: Send + Sync {
    /// Given the current spec, the current file map, and a set of patch
    /// requests, return a new file map. Implementations decide how many
    /// of `current_files`' entries to keep versus regenerate.
    async fn apply_patches(
        &self,
        spec: &Spec,
        current_files: &HashMap<String, String>,
        patch_requests: &[PatchRequest],
    ) -> Result<HashMap<String, String>, BfError>;
}

/// A scripted implementer for tests: applies a fixed closure instead of
/// calling an LLM.
pub struct MockImplementer<F>(pub F)
where
    F: Fn(&HashMap<String, String>, &[PatchRequest]) -> HashMap<String, String> + Send + Sync;

#[async_trait]
impl<F> Implementer for MockImplementer<F>
where
    F: Fn(&HashMap<String, String>, &[PatchRequest]) -> HashMap<String, String> + Send + Sync,
{
    async fn apply_patches(
        &self,
        _spec: &Spec,
        current_files: &HashMap<String, String>,
        patch_requests: &[PatchRequest],
    ) -> Result<HashMap<String, String>, BfError> {
        Ok((self.0)(current_files, patch_requests))
    }
}

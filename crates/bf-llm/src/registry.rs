// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-wide model catalog with explicit fallback chains (§4.4).

/// Metadata for a single LLM model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Stable model identifier, e.g. `"gemini-2.0-flash"`.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Backing provider, e.g. `"google"`.
    pub provider: &'static str,
    /// `"free"` or `"paid"`.
    pub tier: &'static str,
    /// The model to retry with on quota exhaustion. Fallback points UP to
    /// a more capable (and usually stricter-quota) model, never down.
    pub fallback: Option<&'static str>,
}

/// The default starting model when a caller doesn't specify one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gemini-2.0-flash",
        name: "Gemini 2.0 Flash",
        provider: "google",
        tier: "free",
        fallback: Some("gemini-2.5-flash"),
    },
    ModelInfo {
        id: "gemini-2.5-flash",
        name: "Gemini 2.5 Flash",
        provider: "google",
        tier: "free",
        fallback: Some("gemini-2.5-pro"),
    },
    ModelInfo {
        id: "gemini-2.5-pro",
        name: "Gemini 2.5 Pro",
        provider: "google",
        tier: "free",
        fallback: None,
    },
];

/// Look up a model by id.
pub fn get_model(model_id: &str) -> Option<ModelInfo> {
    MODELS.iter().copied().find(|m| m.id == model_id)
}

/// All registered models, for an API listing.
pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}

/// Compute the ordered fallback chain starting at `model_id`, stopping on
/// an unknown model, a `None` fallback, or a cycle (§4.4: "always finite
/// and unique per start model").
pub fn fallback_chain(model_id: &str) -> Vec<&'static str> {
    let mut chain = Vec::new();
    let mut visited = std::collections::HashSet::new();
    let mut current = Some(model_id.to_string());

    while let Some(id) = current {
        if !visited.insert(id.clone()) {
            break;
        }
        let Some(model) = get_model(&id) else { break };
        chain.push(model.id);
        current = model.fallback.map(str::to_string);
    }

    chain
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fallback_chain_is_always_finite_and_has_no_repeats(idx in 0usize..MODELS.len()) {
            let chain = fallback_chain(MODELS[idx].id);
            prop_assert!(chain.len() <= MODELS.len());
            let unique: std::collections::HashSet<_> = chain.iter().collect();
            prop_assert_eq!(unique.len(), chain.len());
        }
    }
}

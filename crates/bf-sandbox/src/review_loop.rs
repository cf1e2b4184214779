// SPDX-License-Identifier: MIT OR Apache-2.0
//! The interleaved code reviewer stage and its trust-score monotonicity
//! invariant (§4.7 "Review interleaving").

use crate::implementer::Implementer;
use async_trait::async_trait;
use bf_core::{PatchRequest, Spec};
use bf_error::BfError;
use std::collections::HashMap;

/// Caps the combined implementer/reviewer loop (§4.7 default).
pub const MAX_REVIEW_ATTEMPTS: u32 = 5;
/// The trust score threshold at which the reviewer's approval can end
/// the loop (§4.7: "stops when trust score >= 7 AND reviewer approves").
pub const APPROVAL_SCORE_THRESHOLD: u8 = 7;

/// One reviewer pass over a file map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Trust score in `[0, 10]`.
    pub score: u8,
    /// Whether the reviewer approves outright.
    pub approved: bool,
    /// Patch requests the reviewer wants applied, tagged with its reason.
    pub patch_requests: Vec<PatchRequest>,
}

/// A static-analysis + LLM-judged review pass, independent of the
/// sandbox's deploy/test cycle.
#[async_trait]
pub trait CodeReviewer: Send + Sync {
    /// Review `files` against `spec`, optionally informed by the
    /// previous attempt's score to enforce monotonicity upstream of
    /// [`enforce_score_floor`].
    async fn review(
        &self,
        spec: &Spec,
        files: &HashMap<String, String>,
        previous_score: Option<u8>,
    ) -> Result<ReviewOutcome, BfError>;
}

/// Clamp a freshly reported score so it never regresses below the
/// previous attempt's score (§5: "Reviewer score monotonicity … is an
/// ordering invariant").
pub fn enforce_score_floor(reported_score: u8, previous_score: Option<u8>) -> u8 {
    match previous_score {
        Some(floor) => reported_score.max(floor),
        None => reported_score,
    }
}

/// Whether an outcome with this (floored) score and approval flag should
/// end the combined loop.
pub fn is_approved(score: u8, approved: bool) -> bool {
    approved && score >= APPROVAL_SCORE_THRESHOLD
}

/// How a [`run_review_loop`] call ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewLoopOutcome {
    /// The reviewer approved with a floored score at or above the
    /// threshold.
    Approved {
        /// Files as they stood at approval.
        files: HashMap<String, String>,
        /// The floored score the reviewer approved at.
        score: u8,
    },
    /// [`MAX_REVIEW_ATTEMPTS`] passed without approval, or the reviewer
    /// stopped requesting patches without approving.
    AttemptsExhausted {
        /// Files as they stood after the last reviewed pass.
        files: HashMap<String, String>,
        /// The floored score at the final attempt.
        score: u8,
    },
}

/// Drive `reviewer` and `implementer` together (§4.7 "Review
/// interleaving"): review the file map, apply any requested patches, and
/// repeat up to [`MAX_REVIEW_ATTEMPTS`] times, stopping as soon as
/// [`is_approved`] holds for the floored score. `previous_score` seeds
/// the floor so the invariant holds across calls spanning multiple
/// sandbox repair attempts, not just within one call.
pub async fn run_review_loop(
    reviewer: &dyn CodeReviewer,
    implementer: &dyn Implementer,
    spec: &Spec,
    mut files: HashMap<String, String>,
    previous_score: Option<u8>,
) -> Result<ReviewLoopOutcome, BfError> {
    let mut floor = previous_score;

    for _ in 1..=MAX_REVIEW_ATTEMPTS {
        let outcome = reviewer.review(spec, &files, floor).await?;
        let score = enforce_score_floor(outcome.score, floor);
        floor = Some(score);

        if is_approved(score, outcome.approved) {
            return Ok(ReviewLoopOutcome::Approved { files, score });
        }
        if outcome.patch_requests.is_empty() {
            return Ok(ReviewLoopOutcome::AttemptsExhausted { files, score });
        }
        files = implementer
            .apply_patches(spec, &files, &outcome.patch_requests)
            .await?;
    }

    Ok(ReviewLoopOutcome::AttemptsExhausted {
        files,
        score: floor.unwrap_or(0),
    })
}

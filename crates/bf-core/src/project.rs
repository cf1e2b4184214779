// SPDX-License-Identifier: MIT OR Apache-2.0
//! The persistent record for a single generation attempt, and its state
//! machine (§3, §4.6).

use bf_error::BfErrorDto;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The Project's lifecycle state (§4.6).
///
/// ```text
/// pending -> generating -> awaiting_verification -> completed
///                                                 -> failed
///         -> failed                                  (on verify report)
/// failed  -> generating  (only via explicit auto-fix request)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created but no pipeline stage has started.
    Pending,
    /// The spec agent / reviewer / render / archive stages are running.
    Generating,
    /// The archive was written; waiting for an external verification report.
    AwaitingVerification,
    /// Verification reported success.
    Completed,
    /// A stage failed unrecoverably, or verification reported failure.
    Failed,
}

/// A transition the state machine does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition: {from:?} -> {to:?}")]
pub struct IllegalTransition {
    /// The state the project was in.
    pub from: ProjectStatus,
    /// The state the caller attempted to move to.
    pub to: ProjectStatus,
}

impl ProjectStatus {
    /// Whether `self -> next` is a transition allowed by §4.6.
    ///
    /// `allow_autofix` gates the one extra edge (`Failed -> Generating`)
    /// that only the explicit auto-fix request (§6) may take; the normal
    /// pipeline never re-enters `Generating` from `Failed` on its own.
    pub fn can_transition_to(self, next: ProjectStatus, allow_autofix: bool) -> bool {
        use ProjectStatus::*;
        match (self, next) {
            (Pending, Generating) => true,
            (Pending, Failed) => true,
            (Generating, Failed) => true,
            (Generating, AwaitingVerification) => true,
            (AwaitingVerification, Completed) => true,
            (AwaitingVerification, Failed) => true,
            (Failed, Generating) => allow_autofix,
            _ => false,
        }
    }
}

/// The persistent record for a single generation attempt (§3).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    /// Unique identifier.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Human-facing project name (pre-validation; the [`crate::Spec`]'s
    /// `project_name` is the validated slug derived from this).
    pub project_name: String,
    /// The prompt that produced (or last refined) this project.
    pub prompt: String,
    /// Current lifecycle state.
    pub status: ProjectStatus,
    /// Which LLM model ultimately produced the spec, if generation succeeded.
    pub model_used: Option<String>,
    /// Opaque JSON: the validated `Spec`, kept as a string end-to-end per
    /// §9 ("avoid intermediate typed-then-untyped conversions").
    pub spec_json: Option<String>,
    /// Opaque JSON: the `ReviewReport` from C5.
    pub validation_json: Option<String>,
    /// Opaque JSON: the `VerificationReport` or `SandboxTestReport`.
    pub verification_json: Option<String>,
    /// User-scoped relative path to the archive, once written.
    pub zip_path: Option<String>,
    /// Structured detail of the failure that produced `Failed`, if any.
    pub last_error: Option<BfErrorDto>,
    /// Set when the project moved to `Failed` because of cancellation,
    /// rather than a stage failure (§5).
    pub cancelled: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a brand-new project in the `Pending` state.
    pub fn new(user_id: Uuid, project_name: impl Into<String>, prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            project_name: project_name.into(),
            prompt: prompt.into(),
            status: ProjectStatus::Pending,
            model_used: None,
            spec_json: None,
            validation_json: None,
            verification_json: None,
            zip_path: None,
            last_error: None,
            cancelled: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attempt a state transition, updating `updated_at` on success.
    pub fn transition(
        &mut self,
        next: ProjectStatus,
        allow_autofix: bool,
    ) -> Result<(), IllegalTransition> {
        if !self.status.can_transition_to(next, allow_autofix) {
            return Err(IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Resume this project for a REFINE flow: overwrite the prompt and
    /// reset status to `Pending` (§4.6 step 1).
    pub fn resume_for_refine(&mut self, new_prompt: impl Into<String>) {
        self.prompt = new_prompt.into();
        self.status = ProjectStatus::Pending;
        self.last_error = None;
        self.cancelled = false;
        self.updated_at = Utc::now();
    }

    /// Mark the project `Failed` with structured error detail.
    pub fn fail(&mut self, error: BfErrorDto, allow_autofix: bool) -> Result<(), IllegalTransition> {
        self.transition(ProjectStatus::Failed, allow_autofix)?;
        self.last_error = Some(error);
        Ok(())
    }

    /// Mark the project `Failed` due to cancellation (§5).
    pub fn cancel(&mut self) -> Result<(), IllegalTransition> {
        self.transition(ProjectStatus::Failed, false)?;
        self.cancelled = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_error::ErrorCode;

    fn project() -> Project {
        Project::new(Uuid::new_v4(), "todo-api", "a todo api")
    }

    #[test]
    fn new_project_is_pending() {
        assert_eq!(project().status, ProjectStatus::Pending);
    }

    #[test]
    fn happy_path_transitions() {
        let mut p = project();
        p.transition(ProjectStatus::Generating, false).unwrap();
        p.transition(ProjectStatus::AwaitingVerification, false)
            .unwrap();
        p.transition(ProjectStatus::Completed, false).unwrap();
        assert_eq!(p.status, ProjectStatus::Completed);
    }

    #[test]
    fn cannot_skip_generating() {
        let mut p = project();
        let err = p
            .transition(ProjectStatus::AwaitingVerification, false)
            .unwrap_err();
        assert_eq!(err.from, ProjectStatus::Pending);
    }

    #[test]
    fn failed_to_generating_requires_autofix_flag() {
        let mut p = project();
        p.transition(ProjectStatus::Generating, false).unwrap();
        p.transition(ProjectStatus::Failed, false).unwrap();
        assert!(p.transition(ProjectStatus::Generating, false).is_err());
        assert!(p.transition(ProjectStatus::Generating, true).is_ok());
    }

    #[test]
    fn completed_is_terminal() {
        let mut p = project();
        p.transition(ProjectStatus::Generating, false).unwrap();
        p.transition(ProjectStatus::AwaitingVerification, false)
            .unwrap();
        p.transition(ProjectStatus::Completed, false).unwrap();
        assert!(p.transition(ProjectStatus::Failed, false).is_err());
    }

    #[test]
    fn fail_records_structured_error() {
        let mut p = project();
        p.transition(ProjectStatus::Generating, false).unwrap();
        let err = BfErrorDto {
            code: ErrorCode::SpecInvalid,
            message: "bad spec".into(),
            context: Default::default(),
            source_message: None,
        };
        p.fail(err.clone(), false).unwrap();
        assert_eq!(p.status, ProjectStatus::Failed);
        assert_eq!(p.last_error, Some(err));
    }

    #[test]
    fn cancel_sets_marker() {
        let mut p = project();
        p.transition(ProjectStatus::Generating, false).unwrap();
        p.cancel().unwrap();
        assert!(p.cancelled);
        assert_eq!(p.status, ProjectStatus::Failed);
    }

    #[test]
    fn resume_for_refine_resets_to_pending() {
        let mut p = project();
        p.transition(ProjectStatus::Generating, false).unwrap();
        p.transition(ProjectStatus::AwaitingVerification, false)
            .unwrap();
        p.resume_for_refine("also add a priority field");
        assert_eq!(p.status, ProjectStatus::Pending);
        assert_eq!(p.prompt, "also add a priority field");
    }

    #[test]
    fn status_is_always_one_of_the_five_externally() {
        // §8: "the Project's status is one of {...} at every
        // externally-observable instant" — trivially true by type, but we
        // assert the full transition graph never produces anything else.
        let mut p = project();
        let sequence = [
            ProjectStatus::Generating,
            ProjectStatus::AwaitingVerification,
            ProjectStatus::Completed,
        ];
        for next in sequence {
            p.transition(next, false).unwrap();
            assert!(matches!(
                p.status,
                ProjectStatus::Pending
                    | ProjectStatus::Generating
                    | ProjectStatus::AwaitingVerification
                    | ProjectStatus::Completed
                    | ProjectStatus::Failed
            ));
        }
    }
}

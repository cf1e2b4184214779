// SPDX-License-Identifier: MIT OR Apache-2.0
//! The 9-step generation pipeline sequence (§4.6).

use crate::cancel::CancellationToken;
use crate::collaborators::{ArchiveAssembler, ProjectStorage, Templating};
use crate::events::{EventBus, PipelineEvent, Stage};
use bf_core::{Project, ProjectStatus};
use bf_error::{BfError, ErrorCode};
use bf_llm::LlmProvider;
use uuid::Uuid;

/// Optional RAG/history context threaded into spec generation (§4.6 step 2).
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    /// Retrieved document context, if any.
    pub retrieved_context: Option<String>,
    /// Prior (role, content) turns for a REFINE flow.
    pub prior_messages: Vec<(String, String)>,
    /// Model to start the fallback chain from; `None` uses the default.
    pub starting_model_id: Option<String>,
}

/// The collaborator set a pipeline run needs (§6).
pub struct Collaborators<'a> {
    /// LLM provider driving spec generation.
    pub llm: &'a dyn LlmProvider,
    /// Pure spec-to-files renderer.
    pub templating: &'a dyn Templating,
    /// Archive packer.
    pub archiver: &'a dyn ArchiveAssembler,
    /// Artifact storage.
    pub storage: &'a dyn ProjectStorage,
}

/// Drive one project through the full generation pipeline (§4.6 steps
/// 2-9). Step 1 (create-or-resume) is the caller's responsibility, since
/// it depends on whether this is a fresh GENERATE or a REFINE targeting
/// an existing project (C1's job, not this crate's).
pub async fn run_generation(
    project: &mut Project,
    context: &GenerationContext,
    collaborators: &Collaborators<'_>,
    cancel: &CancellationToken,
    bus: &EventBus,
) -> Result<(), BfError> {
    macro_rules! check_cancelled {
        () => {
            if cancel.is_cancelled() {
                project.cancel().ok();
                return Err(BfError::new(ErrorCode::Internal, "pipeline cancelled"));
            }
        };
    }

    project
        .transition(ProjectStatus::Generating, false)
        .map_err(|e| BfError::new(ErrorCode::Internal, e.to_string()))?;

    bus.publish(enter(project.id, Stage::SpecGeneration));
    check_cancelled!();

    let prior_messages: Vec<(String, String)> = context.prior_messages.clone();
    let (spec, model_used) = match bf_spec_agent::generate_spec_from_prompt(
        collaborators.llm,
        &project.prompt,
        context.starting_model_id.as_deref(),
        context.retrieved_context.as_deref(),
        &prior_messages,
        bf_spec_agent::DEFAULT_MAX_RETRIES,
    )
    .await
    {
        Ok(ok) => ok,
        Err(err) => return fail(project, Stage::SpecGeneration, err, bus),
    };
    project.model_used = Some(model_used);
    bus.publish(complete(project.id, Stage::SpecGeneration));

    // Step 3: persist spec_json.
    project.spec_json = Some(
        serde_json::to_string(&spec).map_err(|e| BfError::new(ErrorCode::Internal, e.to_string()))?,
    );
    check_cancelled!();

    // Step 4: spec review.
    bus.publish(enter(project.id, Stage::SpecReview));
    let review = bf_reviewer::review(&spec);
    project.validation_json = Some(
        serde_json::to_string(&review.errors)
            .map_err(|e| BfError::new(ErrorCode::Internal, e.to_string()))?,
    );
    if !review.warnings.is_empty() {
        for warning in &review.warnings {
            bus.publish(PipelineEvent::Warning {
                project_id: project.id,
                stage: Stage::SpecReview,
                message: warning.message.clone(),
            });
        }
    }
    if !review.valid {
        let message = review
            .errors
            .iter()
            .map(|e| e.message.clone())
            .collect::<Vec<_>>()
            .join("; ");
        return fail(
            project,
            Stage::SpecReview,
            BfError::new(ErrorCode::SpecInvalid, message),
            bus,
        );
    }
    bus.publish(complete(project.id, Stage::SpecReview));
    check_cancelled!();

    // Step 5: code rendering.
    bus.publish(enter(project.id, Stage::Render));
    let files = match collaborators.templating.render(&spec).await {
        Ok(files) => files,
        Err(err) => return fail(project, Stage::Render, err, bus),
    };
    bus.publish(complete(project.id, Stage::Render));
    check_cancelled!();

    // Step 6: archive assembly.
    bus.publish(enter(project.id, Stage::Archive));
    let archive = match collaborators
        .archiver
        .assemble(spec.project_name.as_str(), &files)
        .await
    {
        Ok(handle) => handle,
        Err(err) => return fail(project, Stage::Archive, err, bus),
    };
    bus.publish(complete(project.id, Stage::Archive));
    check_cancelled!();

    // Step 7: human-readable report is derived by the caller from the
    // persisted artifacts above; this crate only guarantees they exist.

    // Step 8: store the archive.
    bus.publish(enter(project.id, Stage::Store));
    let zip_path = match collaborators
        .storage
        .save(project.user_id, project.id, &archive)
        .await
    {
        Ok(path) => path,
        Err(err) => return fail(project, Stage::Store, err, bus),
    };
    project.zip_path = Some(zip_path);
    bus.publish(complete(project.id, Stage::Store));

    // Step 9: transition to awaiting_verification.
    project
        .transition(ProjectStatus::AwaitingVerification, false)
        .map_err(|e| BfError::new(ErrorCode::Internal, e.to_string()))?;

    Ok(())
}

fn enter(project_id: Uuid, stage: Stage) -> PipelineEvent {
    tracing::debug!(target: "backforge.orchestrator", %project_id, stage = stage.name(), "entering stage");
    PipelineEvent::StageEntered { project_id, stage }
}

fn complete(project_id: Uuid, stage: Stage) -> PipelineEvent {
    tracing::debug!(target: "backforge.orchestrator", %project_id, stage = stage.name(), "stage complete");
    PipelineEvent::StageCompleted { project_id, stage }
}

fn fail(project: &mut Project, stage: Stage, err: BfError, bus: &EventBus) -> Result<(), BfError> {
    bus.publish(PipelineEvent::Error {
        project_id: project.id,
        stage,
        message: err.to_string(),
    });
    let dto = bf_error::BfErrorDto::from(&err);
    project.fail(dto, false).ok();
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{MockArchiveAssembler, MockProjectStorage, MockTemplating};
    use bf_llm::{GenerateRequest, LlmError, MockLlmProvider};
    use std::collections::HashMap;

    fn valid_spec_json() -> String {
        r#"{
            "project_name": "todo-api",
            "description": "A todo API",
            "database": {"kind": "postgres", "version": "15"},
            "auth": {"enabled": false, "kind": "none", "token_expiry_minutes": 60},
            "entities": [{
                "name": "Task",
                "table_name": "tasks",
                "fields": [
                    {"name": "id", "type": "uuid", "primary_key": true, "nullable": false, "unique": true},
                    {"name": "title", "type": "string", "primary_key": false, "nullable": false, "unique": false}
                ],
                "crud": true
            }],
            "spec_version": "1"
        }"#
        .to_string()
    }

    #[tokio::test]
    async fn happy_path_reaches_awaiting_verification() {
        let provider = MockLlmProvider::new();
        provider.push(bf_llm::DEFAULT_MODEL, Ok(valid_spec_json()));

        let mut files = HashMap::new();
        files.insert("app/main.py".to_string(), "pass".to_string());
        let templating = MockTemplating::new(files);
        let archiver = MockArchiveAssembler;
        let storage = MockProjectStorage;
        let collaborators = Collaborators {
            llm: &provider,
            templating: &templating,
            archiver: &archiver,
            storage: &storage,
        };

        let mut project = Project::new(Uuid::new_v4(), "todo-api", "build a todo api");
        let cancel = CancellationToken::new();
        let bus = EventBus::new();

        run_generation(&mut project, &GenerationContext::default(), &collaborators, &cancel, &bus)
            .await
            .unwrap();

        assert_eq!(project.status, ProjectStatus::AwaitingVerification);
        assert!(project.spec_json.is_some());
        assert!(project.zip_path.is_some());
    }

    #[tokio::test]
    async fn spec_generation_failure_marks_project_failed() {
        let provider = MockLlmProvider::new();
        for model in bf_llm::fallback_chain(bf_llm::DEFAULT_MODEL) {
            for _ in 0..3 {
                provider.push(model, Err(LlmError::Terminal("boom".into())));
            }
        }

        let templating = MockTemplating::new(HashMap::new());
        let archiver = MockArchiveAssembler;
        let storage = MockProjectStorage;
        let collaborators = Collaborators {
            llm: &provider,
            templating: &templating,
            archiver: &archiver,
            storage: &storage,
        };

        let mut project = Project::new(Uuid::new_v4(), "todo-api", "build a todo api");
        let cancel = CancellationToken::new();
        let bus = EventBus::new();

        let result = run_generation(&mut project, &GenerationContext::default(), &collaborators, &cancel, &bus).await;
        assert!(result.is_err());
        assert_eq!(project.status, ProjectStatus::Failed);
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits_before_side_effects() {
        let provider = MockLlmProvider::new();
        let templating = MockTemplating::new(HashMap::new());
        let archiver = MockArchiveAssembler;
        let storage = MockProjectStorage;
        let collaborators = Collaborators {
            llm: &provider,
            templating: &templating,
            archiver: &archiver,
            storage: &storage,
        };

        let mut project = Project::new(Uuid::new_v4(), "todo-api", "build a todo api");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let bus = EventBus::new();

        let result = run_generation(&mut project, &GenerationContext::default(), &collaborators, &cancel, &bus).await;
        assert!(result.is_err());
        assert!(project.cancelled);
    }

    #[test]
    fn unused_request_type_reference_compiles() {
        let _: Option<GenerateRequest> = None;
    }
}

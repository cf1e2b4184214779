// SPDX-License-Identifier: MIT OR Apache-2.0
//! The bounded sandbox & repair loop (§4.7): run the reviewer/implementer
//! pass, deploy, health-check, test, and — on failure — extract a
//! diagnosis, ask the implementer for a patch, and try again up to
//! [`MAX_REPAIR_ATTEMPTS`] times.

use crate::extract_failure::{extract_failure, tail};
use crate::implementer::Implementer;
use crate::patch::build_patch_requests;
use crate::port_pool::PortPool;
use crate::review_loop::{run_review_loop, CodeReviewer, ReviewLoopOutcome};
use crate::runner::{wait_for_health, CodeNormalizer, ContainerRunner};
use bf_core::{PatchRequest, Spec};
use bf_core::SandboxTestReport;
use bf_error::BfError;
use std::collections::HashMap;

/// Maximum number of deploy+test attempts before giving up (§4.7 default `R`).
pub const MAX_REPAIR_ATTEMPTS: u32 = 3;

/// The terminal outcome of a repair loop run.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    /// An attempt passed: deployed, healthy, and every endpoint test green.
    Success {
        /// Attempt number (1-based) that succeeded.
        attempt: u32,
        /// Files as they stood at the successful attempt.
        files: HashMap<String, String>,
        /// The winning attempt's report.
        report: SandboxTestReport,
    },
    /// All [`MAX_REPAIR_ATTEMPTS`] attempts were exhausted without success.
    AttemptsExhausted {
        /// The last attempt's report, for surfacing to the caller.
        last_report: SandboxTestReport,
        /// Files as they stood after the final (unsuccessful) attempt.
        files: HashMap<String, String>,
    },
    /// The implementer made no changes in response to a patch request,
    /// so continuing would loop forever on an identical deploy.
    NoChangesApplied {
        /// The attempt number at which the implementer stalled.
        attempt: u32,
    },
}

/// Drive one project's verification through up to [`MAX_REPAIR_ATTEMPTS`]
/// deploy/test/repair cycles (§4.7 steps 1-7), interleaving a bounded
/// reviewer pass (§4.7 "Review interleaving") between the implementer and
/// each redeploy. The reviewer's floored score is threaded across repair
/// attempts so the monotonicity invariant holds for the whole run, not
/// just within one reviewer pass.
pub async fn run_repair_loop(
    runner: &dyn ContainerRunner,
    normalizer: &dyn CodeNormalizer,
    implementer: &dyn Implementer,
    reviewer: &dyn CodeReviewer,
    ports: &mut PortPool,
    spec: &Spec,
    entry_point: &str,
    mut files: HashMap<String, String>,
    test_command_runner: impl Fn(&str) -> (u32, u32, String),
) -> Result<RepairOutcome, BfError> {
    let mut last_report = SandboxTestReport::default();
    let mut review_score: Option<u8> = None;

    for attempt in 1..=MAX_REPAIR_ATTEMPTS {
        let reviewed = run_review_loop(reviewer, implementer, spec, files, review_score).await?;
        let files_for_deploy = match reviewed {
            ReviewLoopOutcome::Approved { files, score } => {
                review_score = Some(score);
                files
            }
            ReviewLoopOutcome::AttemptsExhausted { files, score } => {
                review_score = Some(score);
                files
            }
        };

        let normalized = normalizer.normalize(&files_for_deploy);
        let host_port = ports
            .acquire()
            .map_err(|e| BfError::new(bf_error::ErrorCode::SandboxDeployFailed, e.to_string()))?;
        let label = format!("verify-{attempt}");

        let deploy_result = runner.deploy(&label, host_port, &normalized).await;
        let handle = match deploy_result {
            Ok(h) => h,
            Err(err) => {
                ports.release(host_port);
                last_report = SandboxTestReport {
                    deployed: false,
                    ..Default::default()
                };
                let extracted = extract_failure(&err.to_string());
                let patches = build_patch_requests(&extracted, false, entry_point, &err.to_string());
                match apply_or_stall(implementer, spec, &files_for_deploy, &patches, attempt).await? {
                    ApplyOutcome::Applied(updated) => {
                        files = updated;
                        continue;
                    }
                    ApplyOutcome::Stalled => return Ok(RepairOutcome::NoChangesApplied { attempt }),
                }
            }
        };

        let healthy = wait_for_health(runner, &handle).await.unwrap_or(false);
        let log_tail = runner
            .capture_logs(&handle)
            .await
            .unwrap_or_default();
        let log_tail = tail(&log_tail);

        let (report, patches) = if !healthy {
            let extracted = extract_failure(&log_tail);
            let patches = build_patch_requests(&extracted, false, entry_point, &log_tail);
            let report = SandboxTestReport {
                deployed: true,
                health_check_ok: false,
                test_output: log_tail.clone(),
                error_file_path: extracted.location.as_ref().map(|l| l.file_path.clone()),
                error_line: extracted.location.as_ref().map(|l| l.line),
                traceback_summary: extracted.traceback_summary.clone(),
                ..Default::default()
            };
            (report, patches)
        } else {
            let (passed, failed, output) = test_command_runner(&label);
            let extracted = extract_failure(&output);
            let report = SandboxTestReport {
                deployed: true,
                health_check_ok: true,
                tests_passed: passed,
                tests_failed: failed,
                tests_total: passed + failed,
                test_output: tail(&output),
                failures: extracted.failures.clone(),
                error_file_path: extracted.location.as_ref().map(|l| l.file_path.clone()),
                error_line: extracted.location.as_ref().map(|l| l.line),
                traceback_summary: extracted.traceback_summary.clone(),
            };
            let patches = if failed == 0 {
                Vec::new()
            } else {
                build_patch_requests(&extracted, true, entry_point, &output)
            };
            (report, patches)
        };

        let _ = runner.teardown(&handle).await;
        ports.release(host_port);

        if report.is_success() {
            return Ok(RepairOutcome::Success {
                attempt,
                files: normalized,
                report,
            });
        }

        last_report = report;
        match apply_or_stall(implementer, spec, &normalized, &patches, attempt).await? {
            ApplyOutcome::Applied(updated) => files = updated,
            ApplyOutcome::Stalled => return Ok(RepairOutcome::NoChangesApplied { attempt }),
        }
    }

    Ok(RepairOutcome::AttemptsExhausted {
        last_report,
        files,
    })
}

/// The result of asking the implementer to act on a set of patch requests.
enum ApplyOutcome {
    /// The file map actually changed.
    Applied(HashMap<String, String>),
    /// The implementer returned the file map unchanged — non-progress
    /// (§4.7: "a repair step that returns zero applied changes").
    Stalled,
}

async fn apply_or_stall(
    implementer: &dyn Implementer,
    spec: &Spec,
    files: &HashMap<String, String>,
    patches: &[PatchRequest],
    attempt: u32,
) -> Result<ApplyOutcome, BfError> {
    let updated = implementer.apply_patches(spec, files, patches).await?;
    if updated == *files {
        tracing::warn!(target: "backforge.sandbox", attempt, "implementer made no changes, stopping");
        return Ok(ApplyOutcome::Stalled);
    }
    Ok(ApplyOutcome::Applied(updated))
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! The container lifecycle contract and a pre-deploy normalization stage
//! (§4.7 deploy steps, §9 open question: kept as a distinct stage rather
//! than folded into the runner).

use async_trait::async_trait;
use bf_error::BfError;
use std::collections::HashMap;
use std::time::Duration;

/// Health-poll cadence (§4.7: "every 2 seconds").
pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Health-check wall-clock deadline (§4.7 default).
pub const HEALTH_CHECK_DEADLINE: Duration = Duration::from_secs(90);
/// Container lifecycle command deadline (§5).
pub const CONTAINER_COMMAND_DEADLINE: Duration = Duration::from_secs(30);
/// Teardown deadline (§5).
pub const TEARDOWN_DEADLINE: Duration = Duration::from_secs(30);

/// A uniquely labelled, running container group for one verification
/// attempt (§4.7: `verify-{short-uuid}`).
#[derive(Debug, Clone)]
pub struct DeployHandle {
    /// The unique project label assigned to this attempt.
    pub label: String,
    /// The host port the application is reachable on.
    pub host_port: u16,
}

/// Operations a container backend must support to deploy and tear down a
/// verification attempt. Implementations own the actual container
/// runtime (Docker, Podman, …); this crate only drives the lifecycle.
#[async_trait]
pub trait ContainerRunner: Send + Sync {
    /// Bring up a container group for `files`, bound to `host_port`,
    /// under `label`.
    async fn deploy(
        &self,
        label: &str,
        host_port: u16,
        files: &HashMap<String, String>,
    ) -> Result<DeployHandle, BfError>;

    /// Poll the health endpoint once; `Ok(true)` on HTTP 200.
    async fn poll_health(&self, handle: &DeployHandle) -> Result<bool, BfError>;

    /// Capture the container group's log tail, for diagnostics or failure
    /// extraction.
    async fn capture_logs(&self, handle: &DeployHandle) -> Result<String, BfError>;

    /// Run the project's test suite inside the container group, returning
    /// raw output.
    async fn run_tests(&self, handle: &DeployHandle) -> Result<String, BfError>;

    /// Bring the container group down and remove its volumes. Must not
    /// panic or mask the primary result on failure; callers log and
    /// continue (§4.7 teardown).
    async fn teardown(&self, handle: &DeployHandle) -> Result<(), BfError>;
}

/// Poll `runner`'s health endpoint until healthy or [`HEALTH_CHECK_DEADLINE`]
/// elapses (§4.7 step 4).
pub async fn wait_for_health(
    runner: &dyn ContainerRunner,
    handle: &DeployHandle,
) -> Result<bool, BfError> {
    let deadline = tokio::time::Instant::now() + HEALTH_CHECK_DEADLINE;
    loop {
        if runner.poll_health(handle).await? {
            return Ok(true);
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
    }
}

/// A pre-deploy pass over the rendered file map: normalizes whitespace,
/// line endings, and import ordering before the files ever reach a
/// container. Kept distinct from [`ContainerRunner`] so normalization can
/// be unit-tested without any container dependency.
pub trait CodeNormalizer: Send + Sync {
    /// Normalize a rendered file map in place conceptually, returning a
    /// new map.
    fn normalize(&self, files: &HashMap<String, String>) -> HashMap<String, String>;
}

/// A normalizer that trims trailing whitespace from every line and
/// ensures every file ends with exactly one trailing newline.
#[derive(Debug, Default)]
pub struct WhitespaceNormalizer;

impl CodeNormalizer for WhitespaceNormalizer {
    fn normalize(&self, files: &HashMap<String, String>) -> HashMap<String, String> {
        files
            .iter()
            .map(|(path, content)| {
                let trimmed_lines: Vec<&str> = content.lines().map(str::trim_end).collect();
                let mut normalized = trimmed_lines.join("\n");
                normalized.push('\n');
                (path.clone(), normalized)
            })
            .collect()
    }
}

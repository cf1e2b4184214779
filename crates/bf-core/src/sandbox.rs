// SPDX-License-Identifier: MIT OR Apache-2.0
//! Report and patch types shared between the sandbox & repair loop (C7)
//! and its external collaborators (§3, §6).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The outcome of a single synthetic endpoint test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EndpointResult {
    /// HTTP method, e.g. `"POST"`.
    pub method: String,
    /// Request path.
    pub path: String,
    /// Status code the test expected.
    pub expected_status: u16,
    /// Status code actually observed.
    pub actual_status: u16,
    /// Whether `actual_status == expected_status` (and, for bodies that are
    /// compared, the payload matched field-by-field).
    pub passed: bool,
    /// Error detail, if any.
    pub error: Option<String>,
}

/// Report produced by an external verification client (§3, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VerificationReport {
    /// Whether every endpoint test passed.
    pub passed: bool,
    /// Total wall-clock time for the verification run.
    pub elapsed_ms: u64,
    /// Per-endpoint-test results.
    pub results: Vec<EndpointResult>,
}

/// Report produced by a single sandbox deploy+test attempt (C7).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SandboxTestReport {
    /// Whether the container group came up at all.
    pub deployed: bool,
    /// Whether the health endpoint returned 200 within the deadline.
    pub health_check_ok: bool,
    /// Count of endpoint tests that passed.
    pub tests_passed: u32,
    /// Count of endpoint tests that failed.
    pub tests_failed: u32,
    /// Total endpoint tests attempted.
    pub tests_total: u32,
    /// Raw captured test runner / container log output (bounded tail).
    pub test_output: String,
    /// Named failing test identifiers (bounded to 20, §4.7).
    pub failures: Vec<String>,
    /// File path a traceback frame pinned the failure to, if any.
    pub error_file_path: Option<String>,
    /// Line number within `error_file_path`, if any.
    pub error_line: Option<u32>,
    /// `"Kind: message"` summary of the leading exception header, if any.
    pub traceback_summary: Option<String>,
}

impl SandboxTestReport {
    /// Whether this attempt should be treated as an overall success: healthy
    /// and every endpoint test passed.
    pub fn is_success(&self) -> bool {
        self.deployed
            && self.health_check_ok
            && self.tests_failed == 0
            && self.tests_total == self.tests_passed
    }
}

/// A targeted instruction to regenerate a single file (§4.7, §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PatchRequest {
    /// File to regenerate, relative to the project root.
    pub file_path: String,
    /// Why this file was targeted (traceback summary, "reviewer flagged", …).
    pub reason: String,
    /// Bulleted guidance for the implementer collaborator.
    pub instructions: Vec<String>,
}

impl PatchRequest {
    /// Construct a patch request with no extra instructions beyond the reason.
    pub fn new(file_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            reason: reason.into(),
            instructions: Vec::new(),
        }
    }

    /// Attach an instruction bullet.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }
}

/// An explicit request to re-invoke the repair loop against a `Failed`
/// project (§6: `POST /projects/{id}/fix`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AutoFixRequest {
    /// Monotonically increasing attempt counter, must be ≥ 1.
    pub attempt_number: u32,
    /// Names of tests the client observed failing; must be non-empty.
    pub failed_tests: Vec<String>,
}

/// Rejections of a malformed [`AutoFixRequest`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutoFixRequestError {
    /// `attempt_number` was 0.
    #[error("attempt_number must be >= 1")]
    AttemptNumberZero,
    /// `failed_tests` was empty.
    #[error("failed_tests must be non-empty")]
    NoFailedTests,
}

impl AutoFixRequest {
    /// Validate the request's shape invariants.
    pub fn validate(&self) -> Result<(), AutoFixRequestError> {
        if self.attempt_number == 0 {
            return Err(AutoFixRequestError::AttemptNumberZero);
        }
        if self.failed_tests.is_empty() {
            return Err(AutoFixRequestError::NoFailedTests);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandbox_report_success_requires_all_conditions() {
        let mut r = SandboxTestReport {
            deployed: true,
            health_check_ok: true,
            tests_passed: 3,
            tests_failed: 0,
            tests_total: 3,
            ..Default::default()
        };
        assert!(r.is_success());
        r.tests_failed = 1;
        assert!(!r.is_success());
    }

    #[test]
    fn patch_request_builder() {
        let p = PatchRequest::new("app/models.py", "NameError: name 'Field' is not defined")
            .with_instruction("import Field from the ORM module");
        assert_eq!(p.file_path, "app/models.py");
        assert_eq!(p.instructions.len(), 1);
    }

    #[test]
    fn auto_fix_request_rejects_zero_attempt() {
        let req = AutoFixRequest {
            attempt_number: 0,
            failed_tests: vec!["test_create".into()],
        };
        assert_eq!(req.validate(), Err(AutoFixRequestError::AttemptNumberZero));
    }

    #[test]
    fn auto_fix_request_rejects_empty_failed_tests() {
        let req = AutoFixRequest {
            attempt_number: 1,
            failed_tests: vec![],
        };
        assert_eq!(req.validate(), Err(AutoFixRequestError::NoFailedTests));
    }

    #[test]
    fn auto_fix_request_accepts_valid() {
        let req = AutoFixRequest {
            attempt_number: 1,
            failed_tests: vec!["test_create".into()],
        };
        assert_eq!(req.validate(), Ok(()));
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Patch-request construction policy (§4.7, priority order).

use crate::extract_failure::ExtractedFailure;
use bf_core::PatchRequest;

/// Build the ordered patch requests for one failed attempt, following the
/// §4.7 priority policy:
///
/// 1. A traceback pinpointing an application file wins outright.
/// 2. If health failed and the traceback didn't already name
///    `entry_point`, target the entry point with the log tail as context.
/// 3. Any named failing test that implicates an application file gets its
///    own request.
/// 4. If nothing above produced a request, fall back to a single
///    catch-all against the entry point.
pub fn build_patch_requests(
    extracted: &ExtractedFailure,
    health_check_ok: bool,
    entry_point: &str,
    log_tail: &str,
) -> Vec<PatchRequest> {
    let mut requests = Vec::new();

    if let (Some(location), Some(summary)) = (&extracted.location, &extracted.traceback_summary) {
        requests.push(PatchRequest::new(location.file_path.clone(), summary.clone()).with_instruction(
            format!("traceback points to line {}", location.line),
        ));
    }

    let traceback_names_entry_point = extracted
        .location
        .as_ref()
        .is_some_and(|loc| loc.file_path == entry_point);

    if !health_check_ok && !traceback_names_entry_point && requests.is_empty() {
        requests.push(
            PatchRequest::new(entry_point, "application failed to become healthy")
                .with_instruction(format!("log tail:\n{log_tail}")),
        );
    }

    for failure in &extracted.failures {
        if let Some(file) = test_implicates_app_file(failure) {
            requests.push(PatchRequest::new(file, format!("failing test: {failure}")));
        }
    }

    if requests.is_empty() {
        requests.push(PatchRequest::new(
            entry_point,
            "sandbox failed with no specific diagnostic location",
        ));
    }

    requests
}

/// Best-effort mapping from a pytest node id to the application file it
/// exercises, e.g. `"tests/test_todos.py::test_create"` → `"app/routers/todos.py"`.
/// Returns `None` when the test name gives no clear signal.
fn test_implicates_app_file(failure_line: &str) -> Option<String> {
    let node_id = failure_line.trim_start_matches("FAILED").trim();
    let (path, _) = node_id.split_once("::")?;
    let file_stem = path.strip_prefix("tests/test_")?.strip_suffix(".py")?;
    Some(format!("app/routers/{file_stem}.py"))
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Structured failure extraction from captured log tails (§4.7
//! "Failure extraction — the deep part").

use regex::Regex;
use std::sync::LazyLock;

/// Log tails are truncated to this many characters before parsing
/// (§4.7 truncation policy referenced by the repair loop).
pub const LOG_TAIL_CHARS: usize = 2000;

/// Cap on the number of named pytest failures recorded.
pub const MAX_NAMED_FAILURES: usize = 20;

static TRACEBACK_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"File "[^"]*/(app/\S+\.py)", line (\d+)"#).expect("fixed regex"));

static TRACEBACK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(NameError|ImportError|ModuleNotFoundError|AttributeError|TypeError|ValueError|SyntaxError|IndentationError|KeyError|RuntimeError): (.+)")
        .expect("fixed regex")
});

/// Where a traceback frame pinned a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracebackLocation {
    /// File path relative to the application tree.
    pub file_path: String,
    /// Line number within that file.
    pub line: u32,
}

/// Structured detail extracted from a log tail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFailure {
    /// The last traceback frame referring to application code, if any.
    pub location: Option<TracebackLocation>,
    /// `"Kind: message"` for the leading exception header, if any.
    pub traceback_summary: Option<String>,
    /// Named pytest failures, capped at [`MAX_NAMED_FAILURES`].
    pub failures: Vec<String>,
}

/// Truncate `log` to the trailing [`LOG_TAIL_CHARS`] characters.
pub fn tail(log: &str) -> String {
    let chars: Vec<char> = log.chars().collect();
    if chars.len() <= LOG_TAIL_CHARS {
        return log.to_string();
    }
    chars[chars.len() - LOG_TAIL_CHARS..].iter().collect()
}

/// Extract structured failure detail from a captured log (§4.7).
pub fn extract_failure(log: &str) -> ExtractedFailure {
    let truncated = tail(log);

    let location = TRACEBACK_FILE_RE
        .captures_iter(&truncated)
        .last()
        .map(|caps| TracebackLocation {
            file_path: caps[1].to_string(),
            line: caps[2].parse().unwrap_or(0),
        });

    let traceback_summary = TRACEBACK_HEADER_RE
        .captures(&truncated)
        .map(|caps| format!("{}: {}", &caps[1], caps[2].trim()));

    let failures = extract_named_failures(&truncated);

    ExtractedFailure {
        location,
        traceback_summary,
        failures,
    }
}

/// Extract named pytest failure lines, capped at [`MAX_NAMED_FAILURES`].
pub fn extract_named_failures(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            trimmed.starts_with("FAILED") || (line.contains(" FAILED") && line.contains("::"))
        })
        .map(str::trim)
        .map(str::to_string)
        .take(MAX_NAMED_FAILURES)
        .collect()
}

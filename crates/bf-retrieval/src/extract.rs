// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plain-text extraction by file extension (§4.2 ingestion).

use bf_error::{BfError, ErrorCode};

/// Fixed upload size ceiling: 5 MiB (§4.2).
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// Extract plain text from raw upload bytes, dispatching on the filename's
/// extension.
///
/// - `.txt` / `.md`: decoded as UTF-8 verbatim.
/// - `.json`: parsed and pretty-printed.
/// - `.csv`: each row serialized as `"header: value; ..."`.
/// - anything else: rejected as `UnsupportedDocument`.
///
/// PDF extraction is intentionally not implemented here: it requires a
/// parsing dependency beyond this crate's scope and is out of scope for the
/// MVP ingestion surface; callers that need it should extract page text
/// upstream and pass the result through [`extract_text`] as `.txt`.
pub fn extract_text(filename: &str, raw: &[u8]) -> Result<String, BfError> {
    if raw.len() > MAX_DOCUMENT_BYTES {
        return Err(BfError::new(
            ErrorCode::DocumentTooLarge,
            format!("document exceeds {MAX_DOCUMENT_BYTES} bytes"),
        )
        .with_context("filename", filename)
        .with_context("size_bytes", raw.len()));
    }

    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "txt" | "md" => String::from_utf8(raw.to_vec()).map_err(|e| {
            BfError::new(ErrorCode::UnsupportedDocument, "file is not valid UTF-8")
                .with_source(e)
        }),
        "json" => {
            let value: serde_json::Value = serde_json::from_slice(raw).map_err(|e| {
                BfError::new(ErrorCode::UnsupportedDocument, "invalid JSON").with_source(e)
            })?;
            serde_json::to_string_pretty(&value).map_err(|e| {
                BfError::new(ErrorCode::Internal, "failed to pretty-print JSON").with_source(e)
            })
        }
        "csv" => extract_csv(raw),
        other => Err(BfError::new(
            ErrorCode::UnsupportedDocument,
            format!("unsupported file extension: .{other}"),
        )
        .with_context("filename", filename)),
    }
}

fn extract_csv(raw: &[u8]) -> Result<String, BfError> {
    let text = String::from_utf8(raw.to_vec()).map_err(|e| {
        BfError::new(ErrorCode::UnsupportedDocument, "file is not valid UTF-8").with_source(e)
    })?;
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else {
        return Ok(String::new());
    };
    let headers: Vec<&str> = header_line.split(',').map(str::trim).collect();

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        let row = headers
            .iter()
            .zip(values.iter())
            .map(|(h, v)| format!("{h}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        rows.push(row);
    }
    Ok(rows.join("\n"))
}

// SPDX-License-Identifier: MIT OR Apache-2.0
//! Paragraph-greedy text chunking with overlap (§4.2).

/// Default maximum characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 500;
/// Default overlap, in characters, between consecutive slices of an
/// oversize paragraph.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// Split `text` into chunks of at most `chunk_size` characters, greedily
/// packing whole paragraphs (split on blank lines) and falling back to a
/// character-index slice with `overlap` for any paragraph that alone
/// exceeds `chunk_size`.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for raw_paragraph in text.split("\n\n") {
        let paragraph = raw_paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if current.chars().count() + paragraph.chars().count() + 2 <= chunk_size {
            if current.is_empty() {
                current = paragraph.to_string();
            } else {
                current.push_str("\n\n");
                current.push_str(paragraph);
            }
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current).trim().to_string());
        }

        if paragraph.chars().count() > chunk_size {
            chunks.extend(slice_with_overlap(paragraph, chunk_size, overlap));
        } else {
            current = paragraph.to_string();
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks.retain(|c| !c.is_empty());
    chunks
}

fn slice_with_overlap(paragraph: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    let stride = chunk_size.saturating_sub(overlap).max(1);
    let mut out = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let slice: String = chars[start..end].iter().collect();
        let trimmed = slice.trim();
        if !trimmed.is_empty() {
            out.push(trimmed.to_string());
        }
        start += stride;
    }
    out
}

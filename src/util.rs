// ABOUTME: Small helpers for identifier extraction and filename handling
// ABOUTME: Maps Drive URLs to bare IDs and titles to safe path segments

use crate::{Error, Result};
use regex::Regex;

/// Characters that mark the input as a URL rather than a bare file ID.
const URL_MARKERS: [char; 4] = ['/', ':', '?', '#'];

/// Ordered URL patterns, first match wins. Each captures the ID segment.
const URL_PATTERNS: [&str; 4] = [
    // https://docs.google.com/document/d/FILE_ID/edit (also spreadsheets, presentation)
    r"docs\.google\.com/(?:document|spreadsheets|presentation)/d/([a-zA-Z0-9-_]+)",
    // https://drive.google.com/file/d/FILE_ID/view
    r"drive\.google\.com/file/d/([a-zA-Z0-9-_]+)",
    // https://drive.google.com/open?id=FILE_ID
    r"drive\.google\.com/open\?id=([a-zA-Z0-9-_]+)",
    // https://drive.google.com/drive/folders/FILE_ID
    r"drive\.google\.com/drive/folders/([a-zA-Z0-9-_]+)",
];

/// Extract a file ID from a Google Drive URL, or return the input trimmed if
/// it is already a bare ID.
pub fn extract_file_id(file_id_or_url: &str) -> Result<String> {
    if !file_id_or_url.contains(&URL_MARKERS[..]) {
        return Ok(file_id_or_url.trim().to_string());
    }

    for pattern in URL_PATTERNS {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(captures) = re.captures(file_id_or_url) {
                if let Some(id) = captures.get(1) {
                    return Ok(id.as_str().to_string());
                }
            }
        }
    }

    Err(Error::InvalidInput(format!(
        "Could not extract file ID from: {file_id_or_url}\n\
         Supported formats:\n\
         \x20 - File ID: 1abc123xyz\n\
         \x20 - Google Docs: https://docs.google.com/document/d/FILE_ID/edit\n\
         \x20 - Google Sheets: https://docs.google.com/spreadsheets/d/FILE_ID/edit\n\
         \x20 - Google Slides: https://docs.google.com/presentation/d/FILE_ID/edit\n\
         \x20 - Google Drive: https://drive.google.com/file/d/FILE_ID/view"
    )))
}

/// Replace every character that is unsafe in a path segment with `_`.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect()
}

/// Human-readable file size (B / KB / MB / GB), "N/A" for unknown.
pub fn format_file_size(size_bytes: Option<u64>) -> String {
    let Some(size) = size_bytes else {
        return "N/A".to_string();
    };

    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;

    if size < KB {
        format!("{size} B")
    } else if size < MB {
        format!("{:.1} KB", size as f64 / KB as f64)
    } else if size < GB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else {
        format!("{:.2} GB", size as f64 / GB as f64)
    }
}

use std::fmt::Write as _;

use nini_core::ExportFormat;
use sha2::{Digest, Sha256};
use url::Url;

const MAX_TITLE_CHARS: usize = 80;

/// Windows-safe, deterministic filename: `{sanitized_title}--{thread_id}.{ext}`
pub fn suggested_filename(title: &str, thread_id: &str, format: ExportFormat) -> String {
    let title = sanitize(title, "untitled");
    let id = sanitize(thread_id, "thread");
    format!("{title}--{id}.{}", format.extension())
}

/// Stable thread id for a URL: the numeric topic id from the path when there
/// is one, otherwise a short hash of the URL without query or fragment.
pub fn thread_id_for_url(url: &Url) -> String {
    if let Some(id) = url
        .path_segments()
        .into_iter()
        .flatten()
        .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
    {
        return id.to_string();
    }
    let mut canonical = url.clone();
    canonical.set_query(None);
    canonical.set_fragment(None);
    short_hash(canonical.as_str())
}

fn sanitize(input: &str, fallback: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let mut name: String = compacted.chars().take(MAX_TITLE_CHARS).collect();
    name = name.trim_end_matches(&['_', ' ', '.'][..]).to_string();
    if name.is_empty() {
        name = fallback.to_string();
    }
    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}' | '\u{7F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(12);
    for byte in digest.iter().take(6) {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

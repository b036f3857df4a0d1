//! Attachment filename generation and lookup candidates.

use percent_encoding::percent_decode_str;

/// Original name used when the upload carries none.
pub const DEFAULT_ORIGINAL_NAME: &str = "document.pdf";

/// Replaces every character outside `[A-Za-z0-9._-]` with `_`.
#[must_use]
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Generated attachment filename: `{timestamp_ms}_{sanitized original}`.
#[must_use]
pub fn generate_filename(timestamp_ms: i64, original_name: &str) -> String {
    format!("{timestamp_ms}_{}", sanitize_filename(original_name))
}

/// The uploader's file name without any client-side path, or the default.
#[must_use]
pub fn original_name_or_default(name: Option<&str>) -> String {
    name.map(|n| n.rsplit(['/', '\\']).next().unwrap_or(n).trim())
        .filter(|n| !n.is_empty())
        .map_or_else(|| DEFAULT_ORIGINAL_NAME.to_string(), str::to_string)
}

/// Names to try when looking up a requested filename, in order:
/// decoded, raw, sanitized. Duplicates are dropped.
#[must_use]
pub fn lookup_candidates(requested: &str) -> Vec<String> {
    let decoded = percent_decode_str(requested)
        .decode_utf8()
        .map_or_else(|_| requested.to_string(), |d| d.into_owned());
    let sanitized = sanitize_filename(&decoded);

    let mut candidates: Vec<String> = Vec::with_capacity(3);
    for name in [decoded, requested.to_string(), sanitized] {
        if !name.is_empty() && !candidates.contains(&name) {
            candidates.push(name);
        }
    }
    candidates
}

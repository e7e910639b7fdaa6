//! Shared utility helpers.

use std::path::Path;

/// Case-insensitive substring search without allocating an uppercase copy.
#[inline]
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle_bytes = needle.as_bytes();
    let haystack_bytes = haystack.as_bytes();
    if needle_bytes.len() > haystack_bytes.len() {
        return false;
    }
    haystack_bytes
        .windows(needle_bytes.len())
        .any(|window| window.eq_ignore_ascii_case(needle_bytes))
}

/// Case-insensitive extension check (`ext` without the leading dot).
#[inline]
pub fn has_extension_ci(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// First non-empty line of a statement, shortened for log and warning output.
pub fn statement_preview(sql: &str) -> String {
    const MAX_PREVIEW: usize = 80;

    let line = sql
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    if line.chars().count() > MAX_PREVIEW {
        let cut: String = line.chars().take(MAX_PREVIEW).collect();
        format!("{}...", cut)
    } else {
        line.to_string()
    }
}

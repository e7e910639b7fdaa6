//! Comment stripping and GO batch splitting
//!
//! This is a textual pass, not a tokenizer: comment markers and `GO` tokens
//! inside string literals or identifiers are treated like any others.

use std::sync::LazyLock;

use regex::Regex;

static LINE_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)--.*$").unwrap());

static BLOCK_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// `GO` as a whole word, any case
static GO_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bGO\b").unwrap());

/// Remove `--` line comments, then `/* ... */` block comments.
///
/// Line comments go first, so a `--` inside a block comment swallows the rest
/// of that line, closing marker included.
pub fn strip_comments(content: &str) -> String {
    let without_line_comments = LINE_COMMENT_RE.replace_all(content, "");
    BLOCK_COMMENT_RE
        .replace_all(&without_line_comments, "")
        .into_owned()
}

/// Split raw SQL text into trimmed, non-empty statements.
pub fn split_statements(content: &str) -> Vec<String> {
    let stripped = strip_comments(content);
    GO_SEPARATOR_RE
        .split(&stripped)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

//! Transcript normalization applied before intent matching.

use std::sync::LazyLock;

use regex::Regex;

static TRAILING_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?\u{2026}\u{3002}]+$").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Canonical form for intent matching: trimmed, trailing sentence
/// punctuation removed, whitespace collapsed, lowercased.
pub fn normalize(text: &str) -> String {
    let t = text.trim();
    let t = TRAILING_PUNCT_RE.replace(t, "");
    WHITESPACE_RE.replace_all(&t, " ").to_lowercase()
}

use std::sync::LazyLock;

use regex::Regex;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("html tag regex is valid"));

/// Removes markup tags and trims. Entities are left as-is.
#[must_use]
pub fn strip_html(input: Option<&str>) -> String {
    match input {
        Some(input) if !input.is_empty() => HTML_TAG.replace_all(input, "").trim().to_owned(),
        _ => String::new(),
    }
}

/// Trims, then drops one pair of `"` when it wraps the whole trimmed text.
#[must_use]
pub fn strip_wrapping_quotes(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return trimmed[1..trimmed.len() - 1].trim().to_owned();
    }
    trimmed.to_owned()
}

#[must_use]
pub fn to_sentence_case(input: &str) -> String {
    let lower = input.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Join-key form of free text: trimmed, internal whitespace collapsed, lower-cased.
#[must_use]
pub fn normalize_key(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

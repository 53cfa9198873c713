use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization as _;

use crate::text::strip_wrapping_quotes;

const FALLBACK_SLUG: &str = "untitled";

static NON_SLUG_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug separator regex is valid"));

fn is_combining_mark(ch: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&ch)
}

/// URL-safe routing key for a display name. Never empty.
///
/// Distinct names may collapse onto the same slug; callers group them under
/// one key rather than disambiguating.
#[must_use]
pub fn slugify(input: &str) -> String {
    let folded = strip_wrapping_quotes(input)
        .nfkd()
        .filter(|ch| !is_combining_mark(*ch))
        .collect::<String>()
        .to_lowercase()
        .replace('&', "and");
    let hyphenated = NON_SLUG_RUN.replace_all(&folded, "-");
    let slug = hyphenated.trim_matches('-');

    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug.to_owned()
    }
}

//! Keyword text canonicalization.
//!
//! Each pass is a function `&str -> String` applied in sequence. The result
//! is the merge key consolidation deduplicates on: two strings a human reads
//! as the same keyword (case, punctuation, or spacing differences only) must
//! normalize identically. Stopwords are deliberately left in place — stopword
//! handling belongs to the relevance filter, not the merge key.

use std::sync::LazyLock;

use regex::Regex;

use semplan_shared::NormalizedTerm;

/// Canonicalize raw keyword text into its [`NormalizedTerm`].
///
/// Deterministic and idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> NormalizedTerm {
    let mut result = text.to_string();

    result = strip_entities(&result);
    result = fold_case(&result);
    result = strip_punctuation(&result);
    result = collapse_whitespace(&result);

    NormalizedTerm::new(result)
}

// ---------------------------------------------------------------------------
// Pass 1: Strip HTML entities
// ---------------------------------------------------------------------------

/// Replace leftover HTML entities (`&amp;`, `&#39;`, …) with spaces.
///
/// Collector extraction occasionally leaks these through; they carry no
/// keyword meaning.
fn strip_entities(text: &str) -> String {
    static ENTITY_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"&(?:[a-zA-Z]+|#\d+);").expect("valid regex"));

    ENTITY_RE.replace_all(text, " ").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Fold case
// ---------------------------------------------------------------------------

/// Lowercase the whole string (Unicode-aware).
fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

// ---------------------------------------------------------------------------
// Pass 3: Strip non-semantic punctuation
// ---------------------------------------------------------------------------

/// Replace punctuation with spaces, keeping letters, digits, and whitespace.
///
/// Replacing (rather than deleting) keeps "shoe,sale" as two tokens instead
/// of fusing them into one.
fn strip_punctuation(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pass 4: Collapse whitespace
// ---------------------------------------------------------------------------

/// Collapse internal whitespace runs to single spaces and trim the edges.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! Pairwise keyword similarity.
//!
//! The backend is pluggable so a semantic (embedding-space) implementation
//! can replace the lexical one at configuration time; the clustering
//! algorithm depends only on this interface. Backends must be deterministic
//! for fixed inputs.

use std::collections::BTreeSet;

/// A pluggable keyword-similarity measure. Scores are in `[0, 1]`.
pub trait SimilarityBackend: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Jaccard overlap of lightly-stemmed token sets.
///
/// Light stemming folds trivial plurals so "running shoe" and "running
/// shoes" compare as identical token sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSimilarity;

impl SimilarityBackend for LexicalSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a_tokens = stemmed_tokens(a);
        let b_tokens = stemmed_tokens(b);

        if a_tokens.is_empty() && b_tokens.is_empty() {
            return 1.0;
        }

        let intersection = a_tokens.intersection(&b_tokens).count();
        let union = a_tokens.union(&b_tokens).count();
        if union == 0 {
            0.0
        } else {
            intersection as f64 / union as f64
        }
    }
}

fn stemmed_tokens(text: &str) -> BTreeSet<String> {
    text.split_whitespace()
        .map(|t| stem(&t.to_lowercase()))
        .collect()
}

/// Trim trivial plural suffixes. Not a real stemmer — just enough to make
/// singular/plural keyword variants collide.
fn stem(token: &str) -> String {
    if let Some(base) = token.strip_suffix("ies") {
        if base.len() >= 2 {
            return format!("{base}y");
        }
    }
    if let Some(base) = token.strip_suffix("es") {
        let es_class = base.ends_with('x')
            || base.ends_with('z')
            || base.ends_with("ch")
            || base.ends_with("sh")
            || base.ends_with("ss");
        if base.len() >= 2 && es_class {
            return base.to_string();
        }
    }
    if let Some(base) = token.strip_suffix('s') {
        if base.len() >= 3 && !base.ends_with('s') {
            return base.to_string();
        }
    }
    token.to_string()
}

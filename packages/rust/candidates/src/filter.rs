//! Relevance filtering of candidate keywords.
//!
//! A pure predicate over candidates: survivors pass through unaltered. A
//! candidate is removed when it matches a negative-keyword entry, falls
//! below the relevance minimum, or its token count lands outside the
//! configured window (single too-generic words, excessively long tails).

use tracing::debug;

use semplan_shared::CandidateKeyword;

/// Navigation/boilerplate words that survive extraction but never make
/// useful keywords. The configured negative list extends this.
const BUILTIN_NEGATIVES: &[&str] = &[
    "website", "site", "page", "link", "click", "read", "more", "learn", "here", "menu",
    "navigation", "header", "footer", "login", "signup", "cookie", "privacy",
];

/// Configured relevance predicate for one pipeline run.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    min_relevance: f64,
    min_tokens: usize,
    max_tokens: usize,
    negatives: Vec<String>,
}

impl RelevanceFilter {
    /// Build the filter from tuning values and the configured negative list.
    pub fn new(
        min_relevance: f64,
        min_tokens: usize,
        max_tokens: usize,
        negative_keywords: &[String],
    ) -> Self {
        let mut negatives: Vec<String> =
            BUILTIN_NEGATIVES.iter().map(|s| s.to_string()).collect();
        negatives.extend(
            negative_keywords
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty()),
        );

        Self {
            min_relevance,
            min_tokens,
            max_tokens,
            negatives,
        }
    }

    /// Apply the predicate, keeping survivors unaltered.
    pub fn apply(&self, candidates: Vec<CandidateKeyword>) -> Vec<CandidateKeyword> {
        let input = candidates.len();
        let survivors: Vec<CandidateKeyword> = candidates
            .into_iter()
            .filter(|c| self.is_relevant(c))
            .collect();
        debug!(
            input,
            output = survivors.len(),
            "relevance filter complete"
        );
        survivors
    }

    /// The filtering predicate.
    pub fn is_relevant(&self, candidate: &CandidateKeyword) -> bool {
        if candidate.relevance < self.min_relevance {
            return false;
        }

        let token_count = candidate.term.token_count();
        if token_count < self.min_tokens || token_count > self.max_tokens {
            return false;
        }

        !self.matches_negative(candidate)
    }

    /// True when the term equals a negative entry, contains it as a token,
    /// or contains a multi-word entry as a token-aligned phrase.
    fn matches_negative(&self, candidate: &CandidateKeyword) -> bool {
        let term = candidate.term.as_str();
        let padded = format!(" {term} ");

        self.negatives.iter().any(|neg| {
            if neg.contains(' ') {
                padded.contains(&format!(" {neg} "))
            } else {
                term == neg || candidate.term.tokens().any(|t| t == neg)
            }
        })
    }
}

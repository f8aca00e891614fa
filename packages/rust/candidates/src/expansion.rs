//! Controlled expansion of the filtered candidate set.
//!
//! The strategy is pluggable behind [`ExpansionBackend`] — the shipped
//! [`LexicalExpansion`] applies fixed synonym and question-pattern rules.
//! Any backend must be deterministic for fixed inputs: re-running the
//! pipeline on identical inputs must produce an identical expanded set.
//! Output is capped per seed candidate to keep consolidation and
//! segmentation tractable.

use std::collections::BTreeSet;

use tracing::debug;

use semplan_normalize::normalize;
use semplan_shared::{CandidateKeyword, NormalizedTerm};

/// Token-level synonym substitutions, applied one token at a time.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("buy", &["purchase", "order"]),
    ("cheap", &["affordable", "budget"]),
    ("best", &["top"]),
    ("sale", &["deal", "discount"]),
    ("price", &["cost", "pricing"]),
    ("shop", &["store"]),
];

/// Question/comparison patterns wrapped around a whole term.
const PATTERNS: &[&str] = &[
    "what is {}",
    "how to choose {}",
    "{} alternatives",
    "{} comparison",
    "{} for beginners",
];

// ---------------------------------------------------------------------------
// ExpansionBackend
// ---------------------------------------------------------------------------

/// A pluggable term-expansion strategy.
///
/// Implementations must be deterministic: the same term always yields the
/// same expansion list in the same order.
pub trait ExpansionBackend: Send + Sync {
    /// Related term strings for a seed term. Raw strings — the engine
    /// normalizes and deduplicates them.
    fn expand(&self, term: &NormalizedTerm) -> Vec<String>;
}

/// Rule-based lexical expansion: synonym substitution plus fixed
/// question/comparison patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalExpansion;

impl ExpansionBackend for LexicalExpansion {
    fn expand(&self, term: &NormalizedTerm) -> Vec<String> {
        let mut out = Vec::new();
        let tokens: Vec<&str> = term.tokens().collect();

        // Synonym substitutions, one token at a time.
        for (i, token) in tokens.iter().enumerate() {
            for (word, replacements) in SYNONYMS {
                if token == word {
                    for &replacement in *replacements {
                        let mut variant = tokens.clone();
                        variant[i] = replacement;
                        out.push(variant.join(" "));
                    }
                }
            }
        }

        for pattern in PATTERNS {
            out.push(pattern.replacen("{}", term.as_str(), 1));
        }

        out
    }
}

// ---------------------------------------------------------------------------
// ExpansionEngine
// ---------------------------------------------------------------------------

/// Grows a source's filtered candidate list via the configured backend.
pub struct ExpansionEngine {
    backend: Box<dyn ExpansionBackend>,
    /// Hard cap on synthesized candidates per seed.
    max_per_seed: usize,
    /// Relevance multiplier for expanded candidates.
    decay: f64,
}

impl ExpansionEngine {
    pub fn new(backend: Box<dyn ExpansionBackend>, max_per_seed: usize, decay: f64) -> Self {
        Self {
            backend,
            max_per_seed,
            decay,
        }
    }

    /// Return the input candidates plus expanded ones.
    ///
    /// Expanded candidates inherit the seed's evidence and decayed relevance.
    /// At most `max_per_seed` new candidates are synthesized per seed, and a
    /// term already present in the set is never re-added.
    pub fn expand(&self, candidates: Vec<CandidateKeyword>) -> Vec<CandidateKeyword> {
        let input = candidates.len();
        let mut seen: BTreeSet<NormalizedTerm> =
            candidates.iter().map(|c| c.term.clone()).collect();
        let mut out = candidates;

        for seed_idx in 0..input {
            let seed = out[seed_idx].clone();
            let mut added = 0;
            for raw in self.backend.expand(&seed.term) {
                if added >= self.max_per_seed {
                    break;
                }
                let term = normalize(&raw);
                if term.is_empty() || !seen.insert(term.clone()) {
                    continue;
                }

                out.push(CandidateKeyword {
                    term,
                    source: seed.source,
                    evidence: seed.evidence.clone(),
                    relevance: seed.relevance * self.decay,
                });
                added += 1;
            }
        }

        debug!(input, output = out.len(), "expansion complete");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semplan_shared::{RawObservation, SourceId};

    fn candidate(term: &str, relevance: f64) -> CandidateKeyword {
        CandidateKeyword {
            term: NormalizedTerm::new(term),
            source: SourceId::SerpSuggest,
            evidence: vec![RawObservation::new(SourceId::SerpSuggest, term)],
            relevance,
        }
    }

    fn engine(max_per_seed: usize) -> ExpansionEngine {
        ExpansionEngine::new(Box::new(LexicalExpansion), max_per_seed, 0.85)
    }

    #[test]
    fn expands_with_synonyms_and_patterns() {
        let out = engine(20).expand(vec![candidate("buy running shoes", 1.0)]);
        let terms: Vec<&str> = out.iter().map(|c| c.term.as_str()).collect();
        assert!(terms.contains(&"purchase running shoes"));
        assert!(terms.contains(&"order running shoes"));
        assert!(terms.contains(&"what is buy running shoes"));
    }

    #[test]
    fn expanded_relevance_is_decayed_from_seed() {
        let out = engine(20).expand(vec![candidate("buy shoes", 0.8)]);
        let expanded = out
            .iter()
            .find(|c| c.term.as_str() == "purchase shoes")
            .expect("synonym expansion");
        assert!((expanded.relevance - 0.8 * 0.85).abs() < 1e-9);
    }

    #[test]
    fn cap_is_enforced_per_seed() {
        let seeds = vec![candidate("buy shoes", 1.0), candidate("cheap boots", 1.0)];
        let seed_count = seeds.len();
        let out = engine(2).expand(seeds);
        assert!(out.len() <= seed_count + 2 * seed_count);
    }

    #[test]
    fn existing_terms_never_readded() {
        let out = engine(20).expand(vec![
            candidate("buy shoes", 1.0),
            candidate("purchase shoes", 1.0),
        ]);
        let purchase_count = out
            .iter()
            .filter(|c| c.term.as_str() == "purchase shoes")
            .count();
        assert_eq!(purchase_count, 1);
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let seeds = vec![candidate("buy running shoes", 1.0), candidate("shoe sale", 0.9)];
        let a = engine(5).expand(seeds.clone());
        let b = engine(5).expand(seeds);
        assert_eq!(a, b);
    }

    #[test]
    fn expansion_inherits_evidence() {
        let out = engine(20).expand(vec![candidate("buy shoes", 1.0)]);
        let expanded = out
            .iter()
            .find(|c| c.term.as_str() == "order shoes")
            .expect("expansion");
        assert_eq!(expanded.evidence.len(), 1);
        assert_eq!(expanded.evidence[0].text, "buy shoes");
    }
}

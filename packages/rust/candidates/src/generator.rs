//! Candidate keyword generation from one source's raw observations.
//!
//! Every observation yields its exact normalized form at relevance 1.0, then
//! fixed transformation rules synthesize variants — intent modifiers,
//! adjacent n-grams, pluralization, brand and location modifiers. Each
//! transformation
//! step multiplies relevance by the configured decay factor, so
//! deeper-generated variants score lower. Variants inherit the originating
//! observation as evidence and never fabricate volume/CPC metrics.

use std::collections::BTreeMap;

use tracing::debug;

use semplan_normalize::normalize;
use semplan_shared::{CandidateKeyword, NormalizedTerm, RawObservation};

/// Intent modifiers prepended to a term ("buy running shoes").
const PREFIX_MODIFIERS: &[&str] = &["buy", "best", "cheap"];

/// Intent modifiers appended to a term ("running shoes price").
const SUFFIX_MODIFIERS: &[&str] = &["price", "near me", "online", "sale", "reviews"];

// ---------------------------------------------------------------------------
// GeneratorContext
// ---------------------------------------------------------------------------

/// Brand/seed context the generator draws modifiers from.
#[derive(Debug, Clone, Default)]
pub struct GeneratorContext {
    /// Terms extracted from the brand domain.
    pub brand_terms: Vec<String>,
    /// Operator-provided seed keywords.
    pub seed_keywords: Vec<String>,
    /// Service locations used as geo modifiers.
    pub service_locations: Vec<String>,
}

// ---------------------------------------------------------------------------
// CandidateGenerator
// ---------------------------------------------------------------------------

/// Synthesizes candidate keywords for a single source.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    context: GeneratorContext,
    /// Relevance multiplier per transformation step, in (0, 1).
    decay: f64,
}

impl CandidateGenerator {
    pub fn new(context: GeneratorContext, decay: f64) -> Self {
        Self { context, decay }
    }

    /// Generate the candidate list for one source's observations.
    ///
    /// Candidates deduplicate by normalized term within the source: the
    /// highest relevance wins and evidence merges. A synthesized variant
    /// that lands on a configured seed keyword is known-good and keeps
    /// full relevance.
    pub fn generate(&self, observations: &[RawObservation]) -> Vec<CandidateKeyword> {
        let seeds: std::collections::BTreeSet<NormalizedTerm> = self
            .context
            .seed_keywords
            .iter()
            .map(|s| normalize(s))
            .collect();

        let mut by_term: BTreeMap<NormalizedTerm, CandidateKeyword> = BTreeMap::new();

        for obs in observations {
            let exact = normalize(&obs.text);
            if exact.is_empty() {
                continue;
            }

            insert_candidate(&mut by_term, exact.clone(), obs, 1.0);

            for variant in self.variants_of(&exact) {
                let term = normalize(&variant);
                if term.is_empty() || term == exact {
                    continue;
                }
                let relevance = if seeds.contains(&term) { 1.0 } else { self.decay };
                insert_candidate(&mut by_term, term, obs, relevance);
            }
        }

        let candidates: Vec<CandidateKeyword> = by_term.into_values().collect();
        debug!(
            observations = observations.len(),
            candidates = candidates.len(),
            "candidate generation complete"
        );
        candidates
    }

    /// One-step variants of an exact term. Deterministic order.
    fn variants_of(&self, term: &NormalizedTerm) -> Vec<String> {
        let mut variants = Vec::new();
        let text = term.as_str();

        for prefix in PREFIX_MODIFIERS {
            variants.push(format!("{prefix} {text}"));
        }
        for suffix in SUFFIX_MODIFIERS {
            variants.push(format!("{text} {suffix}"));
        }
        for brand in &self.context.brand_terms {
            variants.push(format!("{brand} {text}"));
        }
        for location in &self.context.service_locations {
            variants.push(format!("{text} {location}"));
        }

        // Adjacent bigrams of longer phrases surface the embedded keywords.
        let tokens: Vec<&str> = term.tokens().collect();
        if tokens.len() >= 3 {
            for pair in tokens.windows(2) {
                variants.push(pair.join(" "));
            }
        }

        if let Some(plural) = pluralize(&tokens) {
            variants.push(plural);
        }

        variants
    }
}

/// Insert or merge a candidate, keeping the highest relevance seen.
fn insert_candidate(
    by_term: &mut BTreeMap<NormalizedTerm, CandidateKeyword>,
    term: NormalizedTerm,
    obs: &RawObservation,
    relevance: f64,
) {
    match by_term.get_mut(&term) {
        Some(existing) => {
            existing.relevance = existing.relevance.max(relevance);
            if !existing
                .evidence
                .iter()
                .any(|e| e.source == obs.source && e.text == obs.text)
            {
                existing.evidence.push(obs.clone());
            }
        }
        None => {
            by_term.insert(
                term.clone(),
                CandidateKeyword {
                    term,
                    source: obs.source,
                    evidence: vec![obs.clone()],
                    relevance,
                },
            );
        }
    }
}

/// Pluralize the final token of a phrase, or `None` when it already looks
/// plural or is too short to inflect.
fn pluralize(tokens: &[&str]) -> Option<String> {
    let last = tokens.last()?;
    if last.len() < 3 || last.ends_with('s') {
        return None;
    }

    let plural = if last.ends_with("ch")
        || last.ends_with("sh")
        || last.ends_with('x')
        || last.ends_with('z')
    {
        format!("{last}es")
    } else if let Some(stem) = last.strip_suffix('y') {
        match stem.chars().last() {
            Some(c) if !"aeiou".contains(c) => format!("{stem}ies"),
            _ => format!("{last}s"),
        }
    } else {
        format!("{last}s")
    };

    let mut out: Vec<&str> = tokens[..tokens.len() - 1].to_vec();
    out.push(&plural);
    Some(out.join(" "))
}

//! Cross-source consolidation into the canonical keyword set.
//!
//! This is the one place duplicate and metric-conflict resolution happens.
//! Candidates group by normalized term (exact match — no fuzzy matching
//! across distinct terms), evidence merges across sources, and numeric
//! conflicts resolve through the ordered rule list in [`merge`]. The output
//! holds exactly one [`CanonicalKeyword`] per distinct term.

pub mod merge;

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, instrument};

use semplan_normalize::normalize;
use semplan_shared::{
    CandidateKeyword, CanonicalKeyword, CompetitionLevel, NormalizedTerm, RawObservation,
    SourceKind, TrustWeights,
};

use crate::merge::Contribution;

/// Merge all sources' candidate lists into the canonical keyword set.
///
/// Output invariant: no two records share a normalized term. A term with
/// zero numeric evidence still produces a record with unset metrics —
/// downstream stages handle unset explicitly rather than treating it as
/// zero.
#[instrument(skip_all, fields(candidates = candidates.len()))]
pub fn consolidate(
    candidates: Vec<CandidateKeyword>,
    trust_weights: &TrustWeights,
) -> Vec<CanonicalKeyword> {
    let mut groups: BTreeMap<NormalizedTerm, Vec<CandidateKeyword>> = BTreeMap::new();
    for candidate in candidates {
        groups.entry(candidate.term.clone()).or_default().push(candidate);
    }

    let canonical: Vec<CanonicalKeyword> = groups
        .into_iter()
        .map(|(term, group)| merge_group(term, &group, trust_weights))
        .collect();

    debug!(canonical = canonical.len(), "consolidation complete");
    canonical
}

/// Merge one term's candidates from every contributing source.
fn merge_group(
    term: NormalizedTerm,
    group: &[CandidateKeyword],
    trust_weights: &TrustWeights,
) -> CanonicalKeyword {
    let evidence = merged_evidence(group);

    let volume = resolve_field(&evidence, trust_weights, |obs| obs.volume.map(|v| v as f64))
        .map(|v| v.round() as u64);
    let cpc_low = resolve_field(&evidence, trust_weights, |obs| obs.cpc_low);
    let cpc_high = resolve_field(&evidence, trust_weights, |obs| obs.cpc_high);

    let sources: BTreeSet<_> = group.iter().map(|c| c.source).collect();

    CanonicalKeyword {
        display_text: pick_display_text(&term, &evidence),
        volume,
        cpc_low,
        cpc_high,
        competition: vote_competition(&evidence),
        confidence: confidence(group),
        sources,
        term,
    }
}

/// All evidence across the group, deduplicated by `(source, raw text)`.
fn merged_evidence(group: &[CandidateKeyword]) -> Vec<RawObservation> {
    let mut seen: BTreeSet<(String, String)> = BTreeSet::new();
    let mut evidence = Vec::new();

    for candidate in group {
        for obs in &candidate.evidence {
            if seen.insert((obs.source.as_str().to_string(), obs.text.clone())) {
                evidence.push(obs.clone());
            }
        }
    }

    evidence
}

/// Resolve one numeric field through the merge rule list.
fn resolve_field(
    evidence: &[RawObservation],
    trust_weights: &TrustWeights,
    field: impl Fn(&RawObservation) -> Option<f64>,
) -> Option<f64> {
    let contributions: Vec<Contribution> = evidence
        .iter()
        .filter_map(|obs| {
            field(obs).map(|value| Contribution {
                source: obs.source,
                trust_weight: trust_weights.weight(obs.source),
                collected_at: obs.collected_at,
                value,
            })
        })
        .collect();

    merge::resolve(contributions)
}

/// Majority vote among sources reporting a competition level; ties favor
/// the higher (more conservative) level.
fn vote_competition(evidence: &[RawObservation]) -> Option<CompetitionLevel> {
    let mut votes: BTreeMap<CompetitionLevel, usize> = BTreeMap::new();
    for obs in evidence {
        if let Some(level) = obs.competition {
            *votes.entry(level).or_default() += 1;
        }
    }

    votes
        .into_iter()
        .max_by_key(|&(level, count)| (count, level))
        .map(|(level, _)| level)
}

/// Confidence grows with the number of independent source kinds contributing
/// and the group's mean relevance. Used downstream to widen CPC ranges.
fn confidence(group: &[CandidateKeyword]) -> f64 {
    let kinds: BTreeSet<SourceKind> = group.iter().map(|c| c.source.kind()).collect();
    let kind_share = kinds.len() as f64 / 3.0;

    let mean_relevance =
        group.iter().map(|c| c.relevance).sum::<f64>() / group.len().max(1) as f64;

    (kind_share * 0.6 + mean_relevance * 0.4).clamp(0.0, 1.0)
}

/// Shortest, most frequently observed raw variant of this term (tie-break:
/// lexically first). Falls back to the term itself for purely synthesized
/// keywords whose evidence texts normalize elsewhere.
fn pick_display_text(term: &NormalizedTerm, evidence: &[RawObservation]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for obs in evidence {
        if &normalize(&obs.text) == term {
            *counts.entry(obs.text.as_str()).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .min_by(|(a_text, a_count), (b_text, b_count)| {
            a_text
                .len()
                .cmp(&b_text.len())
                .then(b_count.cmp(a_count))
                .then(a_text.cmp(b_text))
        })
        .map(|(text, _)| text.to_string())
        .unwrap_or_else(|| term.as_str().to_string())
}

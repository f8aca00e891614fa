//! Numeric field resolution for cross-source merging.
//!
//! Conflicts resolve through an ordered list of rules, each a pure function
//! `Vec<Contribution> -> Vec<Contribution>`, so the tie-break policy stays
//! auditable and independently testable:
//!
//! 1. sanity — malformed values (NaN, negative) are discarded
//! 2. trust — only contributions with the highest trust weight survive
//! 3. recency — if survivors still span source kinds, the most recently
//!    collected contribution's kind wins
//! 4. average — survivors are now one kind; same-kind observations average
//!
//! Values from different source kinds are never averaged together — their
//! measurement methodologies are not comparable. An empty survivor list
//! resolves to unset rather than a guess.

use chrono::{DateTime, Utc};

use semplan_shared::{SourceId, SourceKind};

/// One source observation's vote for a numeric field.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub source: SourceId,
    pub trust_weight: f64,
    pub collected_at: DateTime<Utc>,
    pub value: f64,
}

impl Contribution {
    fn kind(&self) -> SourceKind {
        self.source.kind()
    }
}

/// Resolve a numeric field from all contributions, applying the rules in
/// priority order. `None` means the field stays unset.
pub fn resolve(contributions: Vec<Contribution>) -> Option<f64> {
    let survivors = rule_average_same_kind(rule_recency(rule_trust(rule_sanity(contributions))));
    survivors.first().map(|c| c.value)
}

/// Rule 1: discard malformed values instead of guessing.
fn rule_sanity(contributions: Vec<Contribution>) -> Vec<Contribution> {
    contributions
        .into_iter()
        .filter(|c| c.value.is_finite() && c.value >= 0.0 && c.trust_weight.is_finite())
        .collect()
}

/// Rule 2: keep only the highest-trust contributions.
fn rule_trust(contributions: Vec<Contribution>) -> Vec<Contribution> {
    let max_weight = contributions
        .iter()
        .map(|c| c.trust_weight)
        .fold(f64::NEG_INFINITY, f64::max);

    contributions
        .into_iter()
        .filter(|c| c.trust_weight == max_weight)
        .collect()
}

/// Rule 3: if survivors span kinds, the most recent contribution's kind
/// wins. Identical timestamps fall back to kind order for determinism.
fn rule_recency(contributions: Vec<Contribution>) -> Vec<Contribution> {
    let winner_kind = match contributions
        .iter()
        .max_by(|a, b| {
            a.collected_at
                .cmp(&b.collected_at)
                .then_with(|| b.kind().cmp(&a.kind()))
        })
        .map(Contribution::kind)
    {
        Some(kind) => kind,
        None => return contributions,
    };

    contributions
        .into_iter()
        .filter(|c| c.kind() == winner_kind)
        .collect()
}

/// Rule 4: collapse same-kind survivors into their mean.
fn rule_average_same_kind(contributions: Vec<Contribution>) -> Vec<Contribution> {
    if contributions.len() <= 1 {
        return contributions;
    }

    let mean = contributions.iter().map(|c| c.value).sum::<f64>() / contributions.len() as f64;
    let mut collapsed = contributions;
    collapsed.truncate(1);
    collapsed[0].value = mean;
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn contribution(
        source: SourceId,
        trust_weight: f64,
        hour: u32,
        value: f64,
    ) -> Contribution {
        Contribution {
            source,
            trust_weight,
            collected_at: at(hour),
            value,
        }
    }

    #[test]
    fn highest_trust_wins() {
        let resolved = resolve(vec![
            contribution(SourceId::BrandSite, 0.9, 10, 1000.0),
            contribution(SourceId::SeedList, 0.5, 12, 400.0),
        ]);
        assert_eq!(resolved, Some(1000.0));
    }

    #[test]
    fn trust_tie_resolved_by_recency() {
        let resolved = resolve(vec![
            contribution(SourceId::BrandSite, 0.7, 8, 100.0),
            contribution(SourceId::SerpSuggest, 0.7, 11, 300.0),
        ]);
        assert_eq!(resolved, Some(300.0));
    }

    #[test]
    fn same_kind_observations_average() {
        let resolved = resolve(vec![
            contribution(SourceId::SerpSuggest, 0.6, 9, 200.0),
            contribution(SourceId::SerpRelated, 0.6, 10, 400.0),
        ]);
        assert_eq!(resolved, Some(300.0));
    }

    #[test]
    fn cross_kind_values_never_average() {
        // Brand (website kind) and suggest (serp kind) tie on trust; the
        // newer serp value wins outright instead of blending.
        let resolved = resolve(vec![
            contribution(SourceId::BrandSite, 0.6, 9, 100.0),
            contribution(SourceId::SerpSuggest, 0.6, 10, 500.0),
        ]);
        assert_eq!(resolved, Some(500.0));
    }

    #[test]
    fn single_reporter_is_used_as_is() {
        let resolved = resolve(vec![contribution(SourceId::SeedList, 0.5, 9, 42.0)]);
        assert_eq!(resolved, Some(42.0));
    }

    #[test]
    fn no_contributions_stays_unset() {
        assert_eq!(resolve(vec![]), None);
    }

    #[test]
    fn malformed_values_fall_back_to_unset() {
        let resolved = resolve(vec![
            contribution(SourceId::BrandSite, 0.9, 10, f64::NAN),
            contribution(SourceId::SerpSuggest, 0.6, 11, -5.0),
        ]);
        assert_eq!(resolved, None);
    }

    #[test]
    fn malformed_value_does_not_shadow_valid_one() {
        let resolved = resolve(vec![
            contribution(SourceId::BrandSite, 0.9, 10, f64::NAN),
            contribution(SourceId::SerpSuggest, 0.6, 11, 250.0),
        ]);
        assert_eq!(resolved, Some(250.0));
    }
}

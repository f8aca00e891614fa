//! Derived scoring for canonical keywords: ROI classification, CPC
//! estimation, and bid recommendations.
//!
//! Keywords below the volume threshold are flagged, never dropped —
//! dropping is a downstream decision. Unset metrics are handled explicitly
//! at every step; an unobserved volume is not an observed zero.

use tracing::{debug, instrument};

use semplan_shared::{
    AdBudgets, CanonicalKeyword, CompetitionLevel, PipelineTuning, ProjectSettings, RoiPotential,
    ScoredKeyword,
};

/// Typical market CPC used as the saturation scale in ROI scoring and as
/// the planning assumption when deriving a target CPA from budgets.
const AVG_CPC: f64 = 2.0;

// ---------------------------------------------------------------------------
// EvaluationEngine
// ---------------------------------------------------------------------------

/// Scores canonical keywords against the project settings.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    conversion_rate: f64,
    target_cpa: f64,
    min_volume: u64,
    roi_high: f64,
    roi_medium: f64,
    cpc_fallback_factor: f64,
}

impl EvaluationEngine {
    pub fn new(settings: &ProjectSettings, budgets: &AdBudgets, tuning: &PipelineTuning) -> Self {
        let target_cpa = settings
            .target_cpa
            .unwrap_or_else(|| derive_target_cpa(budgets, settings.assumed_conversion_rate));

        Self {
            conversion_rate: settings.assumed_conversion_rate,
            target_cpa,
            min_volume: settings.min_search_volume_threshold,
            roi_high: tuning.roi_high_threshold,
            roi_medium: tuning.roi_medium_threshold,
            cpc_fallback_factor: tuning.cpc_fallback_factor,
        }
    }

    /// Annotate every canonical keyword with derived scores. One-to-one:
    /// no records are dropped here.
    #[instrument(skip_all, fields(keywords = keywords.len()))]
    pub fn evaluate(&self, keywords: Vec<CanonicalKeyword>) -> Vec<ScoredKeyword> {
        let scored: Vec<ScoredKeyword> = keywords.into_iter().map(|kw| self.score(kw)).collect();
        debug!(scored = scored.len(), "evaluation complete");
        scored
    }

    fn score(&self, keyword: CanonicalKeyword) -> ScoredKeyword {
        let (cpc_low, cpc_high) = self.effective_cpc_bounds(&keyword);
        let estimated_cpc = match (cpc_low, cpc_high) {
            (Some(low), Some(high)) => (low + high) / 2.0,
            _ => default_cpc(keyword.competition),
        };

        // An unobserved volume offers no evidence it clears the threshold.
        let low_volume = match keyword.volume {
            Some(volume) => volume < self.min_volume,
            None => true,
        };

        let roi_potential = self.classify_roi(keyword.volume, estimated_cpc, keyword.competition);
        let bid_recommendation =
            self.recommend_bid(cpc_low, cpc_high, keyword.confidence, estimated_cpc);

        ScoredKeyword {
            keyword,
            roi_potential,
            estimated_cpc,
            bid_recommendation,
            low_volume,
        }
    }

    /// CPC bounds with a single missing side derived via the fallback
    /// factor. Both missing stays `(None, None)` — the default table takes
    /// over for the point estimate, and bids go unclipped.
    fn effective_cpc_bounds(&self, keyword: &CanonicalKeyword) -> (Option<f64>, Option<f64>) {
        match (keyword.cpc_low, keyword.cpc_high) {
            (Some(low), Some(high)) => (Some(low), Some(high)),
            (Some(low), None) => (Some(low), Some(low * self.cpc_fallback_factor)),
            (None, Some(high)) => (Some(high / self.cpc_fallback_factor), Some(high)),
            (None, None) => (None, None),
        }
    }

    /// Three-tier ROI classification. Monotonic by construction: each
    /// component is a saturating ratio that rises with volume and falls
    /// with CPC/competition, and the weighted sum is bucketed by fixed
    /// thresholds.
    fn classify_roi(
        &self,
        volume: Option<u64>,
        estimated_cpc: f64,
        competition: Option<CompetitionLevel>,
    ) -> RoiPotential {
        let volume_score = match volume {
            Some(v) => v as f64 / (v as f64 + 1000.0),
            None => 0.0,
        };
        let inverse_cpc_score = AVG_CPC / (estimated_cpc.max(0.0) + AVG_CPC);
        let inverse_competition_score = match competition {
            Some(CompetitionLevel::Low) => 1.0,
            Some(CompetitionLevel::Medium) | None => 0.5,
            Some(CompetitionLevel::High) => 0.0,
        };

        let score =
            0.4 * volume_score + 0.3 * inverse_cpc_score + 0.3 * inverse_competition_score;

        if score >= self.roi_high {
            RoiPotential::High
        } else if score >= self.roi_medium {
            RoiPotential::Medium
        } else {
            RoiPotential::Low
        }
    }

    /// Bid ≈ target CPA × conversion rate, clipped into the CPC range when
    /// one is available. Low confidence widens the clipping range — weakly
    /// evidenced keywords should not be clamped as tightly.
    fn recommend_bid(
        &self,
        cpc_low: Option<f64>,
        cpc_high: Option<f64>,
        confidence: f64,
        estimated_cpc: f64,
    ) -> f64 {
        let bid = self.target_cpa * self.conversion_rate;

        let (Some(low), Some(high)) = (cpc_low, cpc_high) else {
            return round_cents(bid);
        };

        let midpoint = estimated_cpc;
        let half_width = (high - low) / 2.0;
        let widened = half_width * (1.0 + (1.0 - confidence.clamp(0.0, 1.0)));

        let floor = (midpoint - widened).max(0.0);
        let ceiling = midpoint + widened;
        round_cents(bid.clamp(floor, ceiling))
    }
}

/// Target CPA from budgets when none is configured: spendable budget over
/// the conversions it is expected to buy at typical CPC.
fn derive_target_cpa(budgets: &AdBudgets, conversion_rate: f64) -> f64 {
    // Hold back 10% of budget for testing/learning.
    let effective_budget = budgets.total() * 0.9;
    let expected_conversions = effective_budget * conversion_rate / AVG_CPC;

    if expected_conversions > 0.0 {
        effective_budget / expected_conversions
    } else {
        50.0
    }
}

/// Default point estimate when no bids were observed, indexed by
/// competition level. Unknown competition uses the medium entry.
fn default_cpc(competition: Option<CompetitionLevel>) -> f64 {
    match competition.unwrap_or(CompetitionLevel::Medium) {
        CompetitionLevel::Low => 1.05,
        CompetitionLevel::Medium => 1.50,
        CompetitionLevel::High => 2.25,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use semplan_shared::{NormalizedTerm, SourceId};

    fn keyword(term: &str) -> CanonicalKeyword {
        CanonicalKeyword {
            term: NormalizedTerm::new(term),
            display_text: term.to_string(),
            volume: None,
            cpc_low: None,
            cpc_high: None,
            competition: None,
            sources: BTreeSet::from([SourceId::BrandSite]),
            confidence: 1.0,
        }
    }

    fn engine() -> EvaluationEngine {
        EvaluationEngine::new(
            &ProjectSettings {
                target_cpa: Some(100.0),
                ..ProjectSettings::default()
            },
            &AdBudgets::default(),
            &PipelineTuning::default(),
        )
    }

    #[test]
    fn low_volume_is_flagged_not_dropped() {
        let scored = engine().evaluate(vec![
            CanonicalKeyword {
                volume: Some(100),
                ..keyword("rare keyword")
            },
            CanonicalKeyword {
                volume: Some(5000),
                ..keyword("popular keyword")
            },
            keyword("unmeasured keyword"),
        ]);

        assert_eq!(scored.len(), 3);
        assert!(scored[0].low_volume);
        assert!(!scored[1].low_volume);
        // No volume evidence at all counts as low volume.
        assert!(scored[2].low_volume);
    }

    #[test]
    fn estimated_cpc_is_midpoint_when_both_bounds_present() {
        let scored = engine().evaluate(vec![CanonicalKeyword {
            cpc_low: Some(1.0),
            cpc_high: Some(3.0),
            ..keyword("running shoes")
        }]);
        assert_eq!(scored[0].estimated_cpc, 2.0);
    }

    #[test]
    fn missing_bound_derived_via_fallback_factor() {
        let scored = engine().evaluate(vec![CanonicalKeyword {
            cpc_low: Some(2.0),
            ..keyword("running shoes")
        }]);
        // high = 2.0 * 1.8; midpoint = (2.0 + 3.6) / 2
        assert!((scored[0].estimated_cpc - 2.8).abs() < 1e-9);
    }

    #[test]
    fn no_bounds_fall_back_to_competition_table() {
        let scored = engine().evaluate(vec![
            CanonicalKeyword {
                competition: Some(CompetitionLevel::High),
                ..keyword("contested keyword")
            },
            keyword("unknown keyword"),
        ]);
        assert_eq!(scored[0].estimated_cpc, 2.25);
        assert_eq!(scored[1].estimated_cpc, 1.50);
    }

    #[test]
    fn roi_is_monotonic_in_volume() {
        let eng = engine();
        let volumes = [0u64, 100, 500, 1000, 5000, 50_000];
        let mut last = RoiPotential::Low;
        for volume in volumes {
            let tier = eng.classify_roi(Some(volume), 1.5, Some(CompetitionLevel::Medium));
            assert!(tier >= last, "tier dropped at volume {volume}");
            last = tier;
        }
    }

    #[test]
    fn roi_never_drops_when_competition_falls() {
        let eng = engine();
        let high = eng.classify_roi(Some(2000), 1.5, Some(CompetitionLevel::High));
        let medium = eng.classify_roi(Some(2000), 1.5, Some(CompetitionLevel::Medium));
        let low = eng.classify_roi(Some(2000), 1.5, Some(CompetitionLevel::Low));
        assert!(medium >= high);
        assert!(low >= medium);
    }

    #[test]
    fn bid_is_clipped_into_cpc_range() {
        // target_cpa 100 × conversion 0.02 = 2.0 raw bid.
        let scored = engine().evaluate(vec![CanonicalKeyword {
            cpc_low: Some(4.0),
            cpc_high: Some(6.0),
            confidence: 1.0,
            ..keyword("expensive keyword")
        }]);
        assert_eq!(scored[0].bid_recommendation, 4.0);
    }

    #[test]
    fn low_confidence_widens_the_clipping_range() {
        let confident = engine().evaluate(vec![CanonicalKeyword {
            cpc_low: Some(4.0),
            cpc_high: Some(6.0),
            confidence: 1.0,
            ..keyword("keyword")
        }]);
        let uncertain = engine().evaluate(vec![CanonicalKeyword {
            cpc_low: Some(4.0),
            cpc_high: Some(6.0),
            confidence: 0.0,
            ..keyword("keyword")
        }]);

        // The widened floor admits a lower bid than the confident one.
        assert!(uncertain[0].bid_recommendation < confident[0].bid_recommendation);
    }

    #[test]
    fn unclipped_bid_without_observed_range() {
        let scored = engine().evaluate(vec![keyword("keyword")]);
        assert_eq!(scored[0].bid_recommendation, 2.0);
    }

    #[test]
    fn target_cpa_derived_from_budgets_when_unset() {
        let engine = EvaluationEngine::new(
            &ProjectSettings::default(),
            &AdBudgets::default(),
            &PipelineTuning::default(),
        );
        // Budget cancels out of the derivation: CPA = AVG_CPC / conversion.
        assert!((engine.target_cpa - AVG_CPC / 0.02).abs() < 1e-9);
    }
}

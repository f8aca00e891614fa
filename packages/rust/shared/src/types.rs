//! Core domain types for the SemPlan keyword pipeline.
//!
//! Lifecycle: [`RawObservation`] (per collector) → [`CandidateKeyword`]
//! (per source) → [`CanonicalKeyword`] (merged, one record per distinct
//! normalized term) → [`ScoredKeyword`] → [`AdGroup`] membership.
//! Each stage consumes the prior stage's full output and produces a new
//! collection; no stage mutates a collection it does not own.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SourceId / SourceKind
// ---------------------------------------------------------------------------

/// Identity of a keyword collector.
///
/// Numeric merge rules in consolidation never average across different
/// [`SourceKind`]s — their measurement methodologies are not comparable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Brand website scrape.
    BrandSite,
    /// Competitor website scrape.
    CompetitorSite,
    /// Search-suggestion (autocomplete) queries.
    SerpSuggest,
    /// Related-searches scraped from result pages.
    SerpRelated,
    /// Seed keywords supplied in the configuration.
    SeedList,
}

/// Methodology family a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// Phrases extracted from scraped web pages.
    Website,
    /// Phrases returned by search-engine surfaces.
    Serp,
    /// Operator-provided seed terms.
    Seed,
}

impl SourceId {
    /// Stable string form, used in logs and cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BrandSite => "brand_site",
            Self::CompetitorSite => "competitor_site",
            Self::SerpSuggest => "serp_suggest",
            Self::SerpRelated => "serp_related",
            Self::SeedList => "seed_list",
        }
    }

    /// The methodology family this source belongs to.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::BrandSite | Self::CompetitorSite => SourceKind::Website,
            Self::SerpSuggest | Self::SerpRelated => SourceKind::Serp,
            Self::SeedList => SourceKind::Seed,
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CompetitionLevel / MatchType / RoiPotential
// ---------------------------------------------------------------------------

/// Advertiser competition reported for a keyword.
///
/// `Ord` follows severity: `Low < Medium < High`. Merge ties resolve to the
/// higher (more conservative) level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

impl CompetitionLevel {
    /// Stable string form for logs and deliverables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Match type assigned to a keyword within an ad group.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Broad,
    Phrase,
    Exact,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Broad => "broad",
            Self::Phrase => "phrase",
            Self::Exact => "exact",
        }
    }
}

/// Ordinal return-on-investment classification.
///
/// `Ord` follows attractiveness: `Low < Medium < High`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RoiPotential {
    Low,
    Medium,
    High,
}

impl RoiPotential {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

// ---------------------------------------------------------------------------
// NormalizedTerm
// ---------------------------------------------------------------------------

/// Canonical text form of a keyword, used as the deduplication key.
///
/// Construct via `semplan_normalize::normalize` — the constructor here does
/// no canonicalization of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedTerm(String);

impl NormalizedTerm {
    /// Wrap an already-normalized string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whitespace-separated tokens of the term.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }

    /// Number of whitespace-separated tokens.
    pub fn token_count(&self) -> usize {
        self.tokens().count()
    }
}

impl std::fmt::Display for NormalizedTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// RawObservation
// ---------------------------------------------------------------------------

/// A single keyword observation produced by a collector.
///
/// Immutable once created; at most one per `(source, raw text)`. Metric
/// fields are optional — not every collector reports them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Collector that produced this observation.
    pub source: SourceId,
    /// Raw keyword text as observed.
    pub text: String,
    /// Seed query that led to this observation, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    /// Page the text was extracted from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
    /// Reported monthly search volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    /// Reported low top-of-page bid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpc_low: Option<f64>,
    /// Reported high top-of-page bid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpc_high: Option<f64>,
    /// Reported competition level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition: Option<CompetitionLevel>,
    /// When the collector observed this keyword.
    pub collected_at: DateTime<Utc>,
}

impl RawObservation {
    /// Minimal observation with no metrics, collected now.
    pub fn new(source: SourceId, text: impl Into<String>) -> Self {
        Self {
            source,
            text: text.into(),
            seed: None,
            origin_url: None,
            volume: None,
            cpc_low: None,
            cpc_high: None,
            competition: None,
            collected_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// CandidateKeyword
// ---------------------------------------------------------------------------

/// A normalized keyword candidate owned by one source's pipeline branch.
///
/// Carries the raw observations it was derived from as evidence. Synthesized
/// variants never fabricate volume/CPC metrics — those stay on the evidence
/// until consolidation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateKeyword {
    /// Canonical term (the future merge key).
    pub term: NormalizedTerm,
    /// Source whose branch produced this candidate.
    pub source: SourceId,
    /// Observations backing this candidate.
    pub evidence: Vec<RawObservation>,
    /// 1.0 for exact observations; decayed per transformation step for
    /// synthesized variants.
    pub relevance: f64,
}

// ---------------------------------------------------------------------------
// CanonicalKeyword
// ---------------------------------------------------------------------------

/// The merged, deduplicated record for one distinct normalized term.
///
/// Invariant: no two canonical keywords in a consolidation output share a
/// term. Metric fields stay `None` when no source reported them — downstream
/// stages must handle unset explicitly rather than treating them as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalKeyword {
    /// Deduplication key.
    pub term: NormalizedTerm,
    /// Preferred human-readable variant among the observed raw texts.
    pub display_text: String,
    /// Merged monthly search volume.
    pub volume: Option<u64>,
    /// Merged low top-of-page bid.
    pub cpc_low: Option<f64>,
    /// Merged high top-of-page bid.
    pub cpc_high: Option<f64>,
    /// Majority-vote competition level.
    pub competition: Option<CompetitionLevel>,
    /// Sources that contributed evidence.
    pub sources: BTreeSet<SourceId>,
    /// 0–1; grows with the number of independent source kinds contributing.
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// ScoredKeyword
// ---------------------------------------------------------------------------

/// A canonical keyword annotated by the evaluation engine. One-to-one with
/// its [`CanonicalKeyword`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredKeyword {
    pub keyword: CanonicalKeyword,
    /// Ordinal ROI classification.
    pub roi_potential: RoiPotential,
    /// Best-effort CPC estimate (always set; falls back to a
    /// competition-indexed default when no bids were observed).
    pub estimated_cpc: f64,
    /// Suggested starting bid.
    pub bid_recommendation: f64,
    /// Below the configured minimum volume threshold (retained, flagged;
    /// dropping is a downstream decision).
    pub low_volume: bool,
}

impl ScoredKeyword {
    /// Volume used for ordering; unset volume sorts last.
    pub fn volume_or_zero(&self) -> u64 {
        self.keyword.volume.unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// AdGroup
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for ad-group identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdGroupId(pub Uuid);

impl AdGroupId {
    /// Generate a new time-sortable ad-group identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for AdGroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AdGroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One keyword's membership in an ad group, with its assigned match type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdGroupMember {
    pub keyword: ScoredKeyword,
    pub match_type: MatchType,
}

/// A themed cluster of scored keywords — the unit campaigns are organized
/// around. Members are ordered by descending volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdGroup {
    pub id: AdGroupId,
    /// Display name ("Running Shoes", "Running Shoes 2", "Other").
    pub name: String,
    /// Theme derived from the group's most representative member.
    pub theme_label: String,
    pub members: Vec<AdGroupMember>,
}

impl AdGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Stage counts / PipelineResult
// ---------------------------------------------------------------------------

/// Input/output record counts for one pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCount {
    pub input: usize,
    pub output: usize,
}

impl StageCount {
    pub fn new(input: usize, output: usize) -> Self {
        Self { input, output }
    }

    /// Records dropped by this stage.
    pub fn dropped(&self) -> usize {
        self.input.saturating_sub(self.output)
    }
}

/// Per-stage counts for the whole run. Stages never silently drop records —
/// any loss is visible here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    /// Observations collected, per source.
    pub collected: std::collections::BTreeMap<SourceId, usize>,
    pub generation: StageCount,
    pub filtering: StageCount,
    pub expansion: StageCount,
    pub consolidation: StageCount,
    pub evaluation: StageCount,
    pub segmentation: StageCount,
}

/// Final output of a pipeline run: the ad groups plus observability counts.
/// No file or display formatting — deliverable generators consume this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub ad_groups: Vec<AdGroup>,
    pub counts: StageCounts,
}

impl PipelineResult {
    /// Total keywords across all ad groups.
    pub fn keyword_count(&self) -> usize {
        self.ad_groups.iter().map(AdGroup::len).sum()
    }
}

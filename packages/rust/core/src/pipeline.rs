//! End-to-end keyword pipeline: collect → generate → filter → expand →
//! consolidate → evaluate → segment.
//!
//! Stages execute strictly in dependency order, each consuming the complete
//! output of its predecessor. Per-source branches (generate → filter →
//! expand) run on blocking tasks in parallel — each source's candidate list
//! is private until the consolidation join, the sole synchronization point.
//! The caller may abort the whole batch between stages by dropping the
//! returned future; no stage supports mid-stage cancellation.

use std::collections::BTreeMap;

use tracing::{info, instrument, warn};

use semplan_candidates::{
    CandidateGenerator, ExpansionEngine, GeneratorContext, LexicalExpansion, RelevanceFilter,
};
use semplan_collectors::{Collector, CollectorContext, brand_terms};
use semplan_consolidate::consolidate;
use semplan_evaluate::EvaluationEngine;
use semplan_segmentation::{LexicalSimilarity, SegmentationEngine};
use semplan_shared::{
    CandidateKeyword, PipelineConfig, PipelineResult, RawObservation, Result, SemPlanError,
    SourceId, StageCount, StageCounts,
};

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when a collector finishes.
    fn source_collected(&self, label: &str, count: usize);
    /// Called when the pipeline completes.
    fn done(&self, result: &PipelineResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn source_collected(&self, _label: &str, _count: usize) {}
    fn done(&self, _result: &PipelineResult) {}
}

// ---------------------------------------------------------------------------
// Pipeline entry
// ---------------------------------------------------------------------------

/// Run the full keyword pipeline.
///
/// 1. Validate configuration
/// 2. Run collectors (failures logged and skipped)
/// 3. Per-source: generate → filter → expand, in parallel
/// 4. Consolidate across sources
/// 5. Evaluate
/// 6. Segment into ad groups
#[instrument(skip_all, fields(brand = %config.brand_url))]
pub async fn run(
    config: &PipelineConfig,
    collectors: &mut [Collector],
    progress: &dyn ProgressReporter,
) -> Result<PipelineResult> {
    config.validate()?;

    let mut counts = StageCounts::default();

    // --- Phase 1: Collection (all I/O happens here, before the stages) ---
    progress.phase("Collecting observations");
    let ctx = CollectorContext::from_config(config);
    let by_source = collect_observations(collectors, &ctx, &mut counts, progress).await?;

    // --- Phase 2: Per-source candidate branches ---
    progress.phase("Generating candidates");
    let candidates = run_source_branches(config, by_source, &mut counts).await?;

    // --- Phase 3: Consolidation ---
    progress.phase("Consolidating keywords");
    let consolidation_input = candidates.len();
    let canonical = consolidate(candidates, &config.trust_weights);
    counts.consolidation = StageCount::new(consolidation_input, canonical.len());

    // --- Phase 4: Evaluation ---
    progress.phase("Scoring keywords");
    let evaluation_input = canonical.len();
    let engine = EvaluationEngine::new(&config.settings, &config.budgets, &config.tuning);
    let scored = engine.evaluate(canonical);
    counts.evaluation = StageCount::new(evaluation_input, scored.len());

    // --- Phase 5: Segmentation ---
    // Zero scored keywords is a valid, reportable outcome: an empty group
    // list, not an error.
    progress.phase("Building ad groups");
    let segmentation_input = scored.len();
    let segmentation = SegmentationEngine::new(
        Box::new(LexicalSimilarity),
        config.tuning.min_similarity,
        config.settings.max_keywords_per_ad_group,
    );
    let ad_groups = segmentation.segment(scored);
    let grouped: usize = ad_groups.iter().map(|g| g.len()).sum();
    counts.segmentation = StageCount::new(segmentation_input, grouped);

    let result = PipelineResult { ad_groups, counts };
    progress.done(&result);

    info!(
        ad_groups = result.ad_groups.len(),
        keywords = result.keyword_count(),
        "pipeline complete"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Run every collector, tolerating individual failures, and group the
/// observations by source. Zero surviving sources is fatal.
async fn collect_observations(
    collectors: &mut [Collector],
    ctx: &CollectorContext,
    counts: &mut StageCounts,
    progress: &dyn ProgressReporter,
) -> Result<BTreeMap<SourceId, Vec<RawObservation>>> {
    let mut by_source: BTreeMap<SourceId, Vec<RawObservation>> = BTreeMap::new();

    for collector in collectors.iter_mut() {
        let label = collector.label();
        match collector.collect(ctx).await {
            Ok(observations) => {
                progress.source_collected(label, observations.len());
                for obs in observations {
                    by_source.entry(obs.source).or_default().push(obs);
                }
            }
            Err(e) => {
                warn!(collector = label, error = %e, "collector failed, proceeding without it");
            }
        }
    }

    for (source, observations) in &by_source {
        counts.collected.insert(*source, observations.len());
    }

    if by_source.is_empty() {
        return Err(SemPlanError::insufficient_data(
            "no collector produced any observations",
        ));
    }

    Ok(by_source)
}

// ---------------------------------------------------------------------------
// Per-source branches
// ---------------------------------------------------------------------------

/// Generate → filter → expand for each source on parallel blocking tasks.
/// The join here is the only synchronization point between branches.
async fn run_source_branches(
    config: &PipelineConfig,
    by_source: BTreeMap<SourceId, Vec<RawObservation>>,
    counts: &mut StageCounts,
) -> Result<Vec<CandidateKeyword>> {
    let context = GeneratorContext {
        brand_terms: brand_terms(&config.brand_url),
        seed_keywords: config.seed_keywords.clone(),
        service_locations: config.service_locations.clone(),
    };

    let observation_total: usize = by_source.values().map(Vec::len).sum();

    let mut handles = Vec::new();
    for (source, observations) in by_source {
        let tuning = config.tuning.clone();
        let context = context.clone();

        handles.push((
            source,
            tokio::task::spawn_blocking(move || {
                let generator = CandidateGenerator::new(context, tuning.relevance_decay);
                let generated = generator.generate(&observations);
                let generated_count = generated.len();

                let filter = RelevanceFilter::new(
                    tuning.min_relevance,
                    tuning.min_tokens,
                    tuning.max_tokens,
                    &tuning.negative_keywords,
                );
                let filtered = filter.apply(generated);
                let filtered_count = filtered.len();

                let expansion = ExpansionEngine::new(
                    Box::new(LexicalExpansion),
                    tuning.max_expansions_per_seed,
                    tuning.relevance_decay,
                );
                let expanded = expansion.expand(filtered);

                (generated_count, filtered_count, expanded)
            }),
        ));
    }

    let mut generated_total = 0;
    let mut filtered_total = 0;
    let mut candidates: Vec<CandidateKeyword> = Vec::new();

    for (source, handle) in handles {
        let (generated, filtered, expanded) = handle.await.map_err(|e| {
            SemPlanError::source(source.as_str(), format!("candidate branch failed: {e}"))
        })?;
        generated_total += generated;
        filtered_total += filtered;
        candidates.extend(expanded);
    }

    counts.generation = StageCount::new(observation_total, generated_total);
    counts.filtering = StageCount::new(generated_total, filtered_total);
    counts.expansion = StageCount::new(filtered_total, candidates.len());

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use semplan_collectors::SeedCollector;
    use semplan_shared::AppConfig;

    fn config(seeds: &[&str]) -> PipelineConfig {
        let toml = format!(
            r#"
[project]
brand_url = "https://apex-running.example.com"
seed_keywords = [{}]

[settings]
max_keywords_per_ad_group = 10
"#,
            seeds
                .iter()
                .map(|s| format!("{s:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let app: AppConfig = toml::from_str(&toml).expect("config");
        PipelineConfig::from_app(&app).expect("pipeline config")
    }

    #[tokio::test]
    async fn seeds_only_run_produces_ad_groups() {
        let config = config(&["running shoes", "trail running shoes", "running shoe sale"]);
        let mut collectors = vec![Collector::Seeds(SeedCollector)];

        let result = run(&config, &mut collectors, &SilentProgress)
            .await
            .expect("pipeline run");

        assert!(!result.ad_groups.is_empty());
        assert!(result.keyword_count() > 0);

        // The partition invariant: segmentation output equals its input.
        assert_eq!(result.counts.segmentation.output, result.counts.segmentation.input);

        // No ad group exceeds the configured cap.
        assert!(result.ad_groups.iter().all(|g| g.len() <= 10));
    }

    #[tokio::test]
    async fn stage_counts_chain_consistently() {
        let config = config(&["running shoes", "yoga mat"]);
        let mut collectors = vec![Collector::Seeds(SeedCollector)];

        let result = run(&config, &mut collectors, &SilentProgress)
            .await
            .expect("pipeline run");

        let counts = &result.counts;
        assert_eq!(counts.collected.get(&SourceId::SeedList), Some(&2));
        assert_eq!(counts.generation.input, 2);
        assert_eq!(counts.filtering.input, counts.generation.output);
        assert_eq!(counts.expansion.input, counts.filtering.output);
        assert_eq!(counts.consolidation.input, counts.expansion.output);
        assert_eq!(counts.evaluation.input, counts.consolidation.output);
        // Evaluation is one-to-one.
        assert_eq!(counts.evaluation.output, counts.evaluation.input);
        assert_eq!(counts.segmentation.input, counts.evaluation.output);
    }

    #[tokio::test]
    async fn empty_collection_is_insufficient_data() {
        let config = config(&[]);
        let mut collectors = vec![Collector::Seeds(SeedCollector)];

        let err = run(&config, &mut collectors, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SemPlanError::InsufficientData { .. }));
    }

    #[tokio::test]
    async fn invalid_config_fails_before_any_stage() {
        let mut config = config(&["running shoes"]);
        config.settings.assumed_conversion_rate = 0.0;
        let mut collectors = vec![Collector::Seeds(SeedCollector)];

        let err = run(&config, &mut collectors, &SilentProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SemPlanError::Config { .. }));
    }

    #[tokio::test]
    async fn deduplicates_within_source_through_the_pipeline() {
        // Case/punctuation variants of one keyword collapse to one term.
        let config = config(&["Buy Running Shoes", "buy running shoes!!"]);
        let mut collectors = vec![Collector::Seeds(SeedCollector)];

        let result = run(&config, &mut collectors, &SilentProgress)
            .await
            .expect("pipeline run");

        let buy_count = result
            .ad_groups
            .iter()
            .flat_map(|g| &g.members)
            .filter(|m| m.keyword.keyword.term.as_str() == "buy running shoes")
            .count();
        assert_eq!(buy_count, 1);
    }
}

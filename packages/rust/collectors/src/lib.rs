//! Keyword collectors — the sources feeding the pipeline.
//!
//! Every collector exposes `collect(&CollectorContext) -> Result<Vec<RawObservation>>`
//! and runs before the pipeline begins; no pipeline stage blocks on network
//! I/O. Collectors may fail independently — the orchestrator downgrades a
//! failure to a logged skip and proceeds with the remaining sources.

pub mod cache;
pub mod context;
pub mod seeds;
pub mod suggest;
pub mod website;

use semplan_shared::{RawObservation, Result};

pub use cache::MetricsCache;
pub use context::CollectorContext;
pub use seeds::{SeedCollector, brand_terms};
pub use suggest::SuggestCollector;
pub use website::WebsiteCollector;

/// The collector set for one run. An enum rather than trait objects so
/// dispatch stays static and the async methods need no boxing.
pub enum Collector {
    Website(WebsiteCollector),
    Suggestions(SuggestCollector),
    Seeds(SeedCollector),
}

impl Collector {
    /// Label used in logs and failure reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Website(_) => "website",
            Self::Suggestions(_) => "suggest",
            Self::Seeds(_) => "seeds",
        }
    }

    /// Run the collector.
    pub async fn collect(&mut self, ctx: &CollectorContext) -> Result<Vec<RawObservation>> {
        match self {
            Self::Website(c) => c.collect(ctx).await,
            Self::Suggestions(c) => c.collect(ctx).await,
            Self::Seeds(c) => Ok(c.collect(ctx)),
        }
    }
}

/// The standard collector set: website scrape, search suggestions (with the
/// injected cache), and configured seeds.
pub fn default_collectors(cache: MetricsCache) -> Result<Vec<Collector>> {
    Ok(vec![
        Collector::Website(WebsiteCollector::new()?),
        Collector::Suggestions(SuggestCollector::new(cache)?),
        Collector::Seeds(SeedCollector),
    ])
}

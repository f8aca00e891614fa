//! Shared input context for all collectors.

use url::Url;

use semplan_shared::PipelineConfig;

/// What collectors need to know about the run: where to look and how much
/// to ask for.
#[derive(Debug, Clone)]
pub struct CollectorContext {
    pub brand_url: Url,
    pub competitor_urls: Vec<Url>,
    pub service_locations: Vec<String>,
    pub seed_keywords: Vec<String>,
    /// Cap on search-suggestion queries per run.
    pub max_serp_queries: usize,
}

impl CollectorContext {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            brand_url: config.brand_url.clone(),
            competitor_urls: config.competitor_urls.clone(),
            service_locations: config.service_locations.clone(),
            seed_keywords: config.seed_keywords.clone(),
            max_serp_queries: config.settings.max_serp_queries,
        }
    }
}

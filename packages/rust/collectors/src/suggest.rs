//! Search-suggestion collector.
//!
//! Queries the public autocomplete endpoint for each seed term (capped by
//! `max_serp_queries`) and records multi-word suggestions as observations.
//! Results cache through the injected [`MetricsCache`] so repeated runs
//! against the same configuration stay off the network.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use semplan_shared::{RawObservation, Result, SemPlanError, SourceId};

use crate::cache::MetricsCache;
use crate::context::CollectorContext;
use crate::seeds::brand_terms;

/// Public autocomplete endpoint (firefox client returns plain JSON).
const DEFAULT_SUGGEST_URL: &str = "https://suggestqueries.google.com/complete/search";

/// User-Agent string for collector requests.
const USER_AGENT: &str = concat!("SemPlan/", env!("CARGO_PKG_VERSION"));

/// Collects autocomplete suggestions for seed terms.
pub struct SuggestCollector {
    client: Client,
    base_url: Url,
    cache: MetricsCache,
}

impl SuggestCollector {
    pub fn new(cache: MetricsCache) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SemPlanError::Network(format!("failed to build HTTP client: {e}")))?;

        let base_url = Url::parse(DEFAULT_SUGGEST_URL).expect("valid default endpoint");

        Ok(Self {
            client,
            base_url,
            cache,
        })
    }

    /// Point the collector at a different endpoint (integration tests, or a
    /// self-hosted suggestion proxy).
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Query suggestions for each seed, up to the configured cap.
    #[instrument(skip_all)]
    pub async fn collect(&mut self, ctx: &CollectorContext) -> Result<Vec<RawObservation>> {
        let mut queries: Vec<String> = ctx.seed_keywords.clone();
        queries.extend(brand_terms(&ctx.brand_url));
        queries.truncate(ctx.max_serp_queries);

        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let mut observations = Vec::new();
        let mut failures = 0usize;

        for query in &queries {
            if let Some(cached) = self.cache.get(SourceId::SerpSuggest, query) {
                debug!(query, count = cached.len(), "suggestion cache hit");
                observations.extend_from_slice(cached);
                continue;
            }

            match self.fetch_suggestions(query).await {
                Ok(fetched) => {
                    debug!(query, count = fetched.len(), "suggestions fetched");
                    self.cache
                        .put(SourceId::SerpSuggest, query, fetched.clone());
                    observations.extend(fetched);
                }
                Err(e) => {
                    warn!(query, error = %e, "suggestion query failed, skipping");
                    failures += 1;
                }
            }
        }

        // Cache persistence is an optimization; a write failure is not
        // worth failing the collection over.
        if let Err(e) = self.cache.persist() {
            warn!(error = %e, "failed to persist suggestion cache");
        }

        if failures == queries.len() && observations.is_empty() {
            return Err(SemPlanError::source(
                SourceId::SerpSuggest.as_str(),
                "every suggestion query failed",
            ));
        }

        Ok(observations)
    }

    async fn fetch_suggestions(&self, seed: &str) -> Result<Vec<RawObservation>> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("client", "firefox")
            .append_pair("q", seed);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| SemPlanError::Network(format!("{seed}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SemPlanError::Network(format!("{seed}: HTTP {status}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SemPlanError::parse(format!("suggestion response for {seed:?}: {e}")))?;

        // Response shape: ["<seed>", ["suggestion", ...], ...]
        let suggestions = body
            .get(1)
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                SemPlanError::parse(format!("unexpected suggestion payload for {seed:?}"))
            })?;

        let observations = suggestions
            .iter()
            .filter_map(|v| v.as_str())
            .filter(|s| s.split_whitespace().count() >= 2)
            .map(|s| RawObservation {
                seed: Some(seed.to_string()),
                ..RawObservation::new(SourceId::SerpSuggest, s)
            })
            .collect();

        Ok(observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // The short brand domain contributes no brand terms, so queries come
    // from the seeds alone.
    fn context(seeds: &[&str]) -> CollectorContext {
        CollectorContext {
            brand_url: Url::parse("https://xy.com").unwrap(),
            competitor_urls: vec![],
            service_locations: vec![],
            seed_keywords: seeds.iter().map(|s| s.to_string()).collect(),
            max_serp_queries: 2,
        }
    }

    fn collector(server: &MockServer) -> SuggestCollector {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = MetricsCache::open(dir.path().join("metrics.json"), 24);
        SuggestCollector::new(cache)
            .expect("collector")
            .with_base_url(Url::parse(&server.uri()).unwrap())
    }

    #[tokio::test]
    async fn parses_multiword_suggestions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "running shoes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                "running shoes",
                ["running shoes sale", "running shoes for flat feet", "shoes"]
            ])))
            .mount(&server)
            .await;

        let mut collector = collector(&server);
        let observations = collector
            .collect(&context(&["running shoes"]))
            .await
            .expect("collect");

        // Single-word suggestions are skipped.
        assert_eq!(observations.len(), 2);
        assert!(observations.iter().all(|o| o.source == SourceId::SerpSuggest));
        assert_eq!(observations[0].seed.as_deref(), Some("running shoes"));
    }

    #[tokio::test]
    async fn query_cap_is_enforced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                "x",
                ["keyword one", "keyword two"]
            ])))
            .expect(2)
            .mount(&server)
            .await;

        let mut collector = collector(&server);
        // Three seeds configured, but max_serp_queries is 2.
        collector
            .collect(&context(&["a b", "c d", "e f"]))
            .await
            .expect("collect");
    }

    #[tokio::test]
    async fn second_run_hits_the_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                "running shoes",
                ["running shoes sale", "buy running shoes"]
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut collector = collector(&server);
        let ctx = context(&["running shoes"]);
        collector.collect(&ctx).await.expect("first run");
        let second = collector.collect(&ctx).await.expect("second run");

        // Same observations, no second HTTP request (mock expects one call).
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn all_queries_failing_is_a_source_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut collector = collector(&server);
        let err = collector
            .collect(&context(&["running shoes"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SemPlanError::Source { .. }));
    }

    #[tokio::test]
    async fn no_seeds_is_an_empty_result_not_an_error() {
        let server = MockServer::start().await;
        let mut collector = collector(&server);

        let observations = collector
            .collect(&context(&[]))
            .await
            .expect("collect");
        assert!(observations.is_empty());
    }
}

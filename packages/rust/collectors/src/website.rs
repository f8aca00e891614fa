//! Brand and competitor website scraping.
//!
//! Fetches each configured site's landing page and extracts candidate
//! keyword phrases from the title, headings, emphasized text, and link
//! anchors. A single failed site is logged and skipped — the collector only
//! errors when every site failed.

use std::time::Duration;

use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

use semplan_shared::{RawObservation, Result, SemPlanError, SourceId};

use crate::context::CollectorContext;

/// User-Agent string for collector requests.
const USER_AGENT: &str = concat!("SemPlan/", env!("CARGO_PKG_VERSION"));

/// Cap on phrases extracted per page.
const MAX_PHRASES_PER_PAGE: usize = 100;

/// Scrapes brand and competitor landing pages for keyword phrases.
pub struct WebsiteCollector {
    client: Client,
}

impl WebsiteCollector {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SemPlanError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Scrape the brand site and every competitor site.
    #[instrument(skip_all)]
    pub async fn collect(&self, ctx: &CollectorContext) -> Result<Vec<RawObservation>> {
        let mut observations = Vec::new();
        let mut failures = 0usize;
        let mut attempts = 0usize;

        let sites = std::iter::once((&ctx.brand_url, SourceId::BrandSite)).chain(
            ctx.competitor_urls
                .iter()
                .map(|url| (url, SourceId::CompetitorSite)),
        );

        for (url, source) in sites {
            attempts += 1;
            match self.scrape_site(url, source).await {
                Ok(mut site_observations) => {
                    debug!(%url, count = site_observations.len(), "site scraped");
                    observations.append(&mut site_observations);
                }
                Err(e) => {
                    warn!(%url, error = %e, "site scrape failed, skipping");
                    failures += 1;
                }
            }
        }

        if failures == attempts {
            return Err(SemPlanError::source(
                "website",
                "every configured site failed to scrape",
            ));
        }

        Ok(observations)
    }

    async fn scrape_site(&self, url: &Url, source: SourceId) -> Result<Vec<RawObservation>> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| SemPlanError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SemPlanError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SemPlanError::Network(format!("{url}: {e}")))?;

        let observations = extract_phrases(&body)
            .into_iter()
            .map(|text| RawObservation {
                origin_url: Some(url.to_string()),
                ..RawObservation::new(source, text)
            })
            .collect();

        Ok(observations)
    }
}

/// Extract keyword-bearing phrases from page HTML.
///
/// Pulls the title, headings, emphasized spans, and link anchors — the
/// elements where sites name their own offerings. Deduplicates per page and
/// caps the result.
fn extract_phrases(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("title, h1, h2, h3, strong, em, a, li")
        .expect("valid selector");

    let mut seen = std::collections::BTreeSet::new();
    let mut phrases = Vec::new();

    for element in doc.select(&selector) {
        let text = element.text().collect::<String>();
        let phrase = text.split_whitespace().collect::<Vec<_>>().join(" ");

        if !is_keyword_phrase(&phrase) {
            continue;
        }
        if seen.insert(phrase.to_lowercase()) {
            phrases.push(phrase);
            if phrases.len() >= MAX_PHRASES_PER_PAGE {
                break;
            }
        }
    }

    phrases
}

/// Keep phrases that look like keywords: short, not numeric, not a sentence.
fn is_keyword_phrase(phrase: &str) -> bool {
    let len = phrase.chars().count();
    if !(3..=60).contains(&len) {
        return false;
    }
    let words = phrase.split_whitespace().count();
    if words > 6 {
        return false;
    }
    phrase.chars().any(|c| c.is_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <html>
          <head><title>Apex Running Shoes</title></head>
          <body>
            <h1>Trail Running Shoes</h1>
            <h2>Road running shoes for every distance</h2>
            <a href="/sale">Running shoe sale</a>
            <p>Some long paragraph of marketing copy that goes on and on and should not become a keyword phrase at all.</p>
            <li>12345</li>
          </body>
        </html>"#;

    fn context(brand: &str) -> CollectorContext {
        CollectorContext {
            brand_url: Url::parse(brand).expect("url"),
            competitor_urls: vec![],
            service_locations: vec![],
            seed_keywords: vec![],
            max_serp_queries: 5,
        }
    }

    #[test]
    fn extracts_heading_and_anchor_phrases() {
        let phrases = extract_phrases(PAGE);
        assert!(phrases.contains(&"Apex Running Shoes".to_string()));
        assert!(phrases.contains(&"Trail Running Shoes".to_string()));
        assert!(phrases.contains(&"Running shoe sale".to_string()));
    }

    #[test]
    fn rejects_sentences_and_numbers() {
        let phrases = extract_phrases(PAGE);
        assert!(!phrases.iter().any(|p| p.contains("marketing copy")));
        assert!(!phrases.contains(&"12345".to_string()));
    }

    #[tokio::test]
    async fn collects_observations_from_mock_site() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let collector = WebsiteCollector::new().expect("collector");
        let observations = collector
            .collect(&context(&server.uri()))
            .await
            .expect("collect");

        assert!(!observations.is_empty());
        assert!(observations.iter().all(|o| o.source == SourceId::BrandSite));
        assert!(observations.iter().all(|o| o.origin_url.is_some()));
        // Scraped phrases carry no fabricated metrics.
        assert!(observations.iter().all(|o| o.volume.is_none()));
    }

    #[tokio::test]
    async fn all_sites_failing_is_a_source_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let collector = WebsiteCollector::new().expect("collector");
        let err = collector.collect(&context(&server.uri())).await.unwrap_err();
        assert!(matches!(err, SemPlanError::Source { .. }));
    }
}

//! Seed-keyword collector and brand-term extraction.
//!
//! The cheapest source: configured seed keywords become observations
//! directly, with no network I/O.

use tracing::debug;
use url::Url;

use semplan_shared::{RawObservation, SourceId};

use crate::context::CollectorContext;

/// Turns configured seed keywords into observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedCollector;

impl SeedCollector {
    pub fn collect(&self, ctx: &CollectorContext) -> Vec<RawObservation> {
        let observations: Vec<RawObservation> = ctx
            .seed_keywords
            .iter()
            .filter(|seed| !seed.trim().is_empty())
            .map(|seed| RawObservation::new(SourceId::SeedList, seed.trim()))
            .collect();

        debug!(count = observations.len(), "seed keywords collected");
        observations
    }
}

/// Extract meaningful terms from a site URL's domain.
///
/// "www.apex-running.example.com" yields ["apex", "running"]. Used both to
/// seed suggestion queries and as generator context.
pub fn brand_terms(url: &Url) -> Vec<String> {
    let Some(host) = url.host_str() else {
        return Vec::new();
    };

    let host = host.strip_prefix("www.").unwrap_or(host);
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() < 2 {
        return Vec::new();
    }

    // The registrable label, minus the TLD tail.
    let domain = parts[parts.len() - 2];

    domain
        .split(['-', '_'])
        .filter(|term| term.len() > 2)
        .map(|term| term.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(seeds: &[&str]) -> CollectorContext {
        CollectorContext {
            brand_url: Url::parse("https://www.apex-running.example.com").unwrap(),
            competitor_urls: vec![],
            service_locations: vec![],
            seed_keywords: seeds.iter().map(|s| s.to_string()).collect(),
            max_serp_queries: 5,
        }
    }

    #[test]
    fn seeds_become_observations() {
        let observations = SeedCollector.collect(&context(&["running shoes", "  ", "trail shoes"]));
        assert_eq!(observations.len(), 2);
        assert!(observations.iter().all(|o| o.source == SourceId::SeedList));
        assert_eq!(observations[0].text, "running shoes");
    }

    #[test]
    fn brand_terms_from_domain() {
        let url = Url::parse("https://www.apex-running.example.com").unwrap();
        assert_eq!(brand_terms(&url), vec!["example".to_string()]);

        let url = Url::parse("https://apex-running.com").unwrap();
        assert_eq!(
            brand_terms(&url),
            vec!["apex".to_string(), "running".to_string()]
        );
    }

    #[test]
    fn short_fragments_are_dropped() {
        let url = Url::parse("https://ab-cdef.com").unwrap();
        assert_eq!(brand_terms(&url), vec!["cdef".to_string()]);
    }
}

//! File-backed cache for collector query results.
//!
//! Injected into collectors as an explicitly-scoped collaborator — never
//! ambient global state. Entries key on `(source, query)` and expire after
//! a TTL, so repeated runs against the same configuration skip redundant
//! network round-trips.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use semplan_shared::{RawObservation, Result, SemPlanError, SourceId};

/// One cached query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    cached_at: DateTime<Utc>,
    observations: Vec<RawObservation>,
}

/// TTL'd, file-backed cache of collector observations.
#[derive(Debug)]
pub struct MetricsCache {
    path: PathBuf,
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl MetricsCache {
    /// Open (or start empty) a cache at `path`. A missing or corrupt file
    /// is treated as empty rather than an error.
    pub fn open(path: impl Into<PathBuf>, ttl_hours: i64) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(?path, error = %e, "cache file corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => {
                debug!(?path, "no cache file, starting empty");
                HashMap::new()
            }
        };

        Self {
            path,
            ttl: Duration::hours(ttl_hours),
            entries,
        }
    }

    /// Cached observations for a query, unless the entry has expired.
    pub fn get(&self, source: SourceId, query: &str) -> Option<&[RawObservation]> {
        let entry = self.entries.get(&cache_key(source, query))?;
        if Utc::now() - entry.cached_at > self.ttl {
            return None;
        }
        Some(&entry.observations)
    }

    /// Store a query result, stamping it with the current time.
    pub fn put(&mut self, source: SourceId, query: &str, observations: Vec<RawObservation>) {
        self.entries.insert(
            cache_key(source, query),
            CacheEntry {
                cached_at: Utc::now(),
                observations,
            },
        );
    }

    /// Write the cache back to disk, dropping expired entries.
    pub fn persist(&mut self) -> Result<()> {
        let now = Utc::now();
        self.entries.retain(|_, entry| now - entry.cached_at <= self.ttl);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SemPlanError::io(parent, e))?;
            }
        }

        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| SemPlanError::parse(format!("cache serialization: {e}")))?;
        std::fs::write(&self.path, content).map_err(|e| SemPlanError::io(&self.path, e))?;

        debug!(path = ?self.path, entries = self.entries.len(), "cache persisted");
        Ok(())
    }

    /// Cache file location.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Stable key for a `(source, query)` pair.
fn cache_key(source: SourceId, query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_str().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(query.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(text: &str) -> RawObservation {
        RawObservation::new(SourceId::SerpSuggest, text)
    }

    #[test]
    fn roundtrip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("metrics.json");

        let mut cache = MetricsCache::open(&path, 24);
        cache.put(SourceId::SerpSuggest, "running shoes", vec![obs("buy running shoes")]);
        cache.persist().expect("persist");

        let reopened = MetricsCache::open(&path, 24);
        let hit = reopened
            .get(SourceId::SerpSuggest, "running shoes")
            .expect("cache hit");
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].text, "buy running shoes");
    }

    #[test]
    fn keys_scope_by_source_and_query() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = MetricsCache::open(dir.path().join("metrics.json"), 24);
        cache.put(SourceId::SerpSuggest, "running shoes", vec![obs("a")]);

        assert!(cache.get(SourceId::SerpRelated, "running shoes").is_none());
        assert!(cache.get(SourceId::SerpSuggest, "trail shoes").is_none());
        assert!(cache.get(SourceId::SerpSuggest, "running shoes").is_some());
    }

    #[test]
    fn expired_entries_miss() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cache = MetricsCache::open(dir.path().join("metrics.json"), -1);
        cache.put(SourceId::SerpSuggest, "running shoes", vec![obs("a")]);

        // A negative TTL expires everything immediately.
        assert!(cache.get(SourceId::SerpSuggest, "running shoes").is_none());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("metrics.json");
        std::fs::write(&path, "not json").expect("write");

        let cache = MetricsCache::open(&path, 24);
        assert!(cache.get(SourceId::SerpSuggest, "anything").is_none());
    }
}

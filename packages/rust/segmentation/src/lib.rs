//! Ad-group segmentation of the scored keyword set.
//!
//! Clusters keywords by pairwise display-text similarity (union-find
//! agglomeration over pairs above the configured threshold), splits
//! over-large clusters into same-theme groups ordered by descending volume,
//! and pools leftover singletons into a catch-all group. Every scored
//! keyword lands in exactly one ad group — the partition invariant.

pub mod similarity;

use tracing::{debug, instrument};

use semplan_shared::{AdGroup, AdGroupId, AdGroupMember, MatchType, ScoredKeyword};

pub use similarity::{LexicalSimilarity, SimilarityBackend};

/// Name given to the catch-all group of unclustered keywords.
const CATCH_ALL_NAME: &str = "Other";

// ---------------------------------------------------------------------------
// SegmentationEngine
// ---------------------------------------------------------------------------

/// Groups scored keywords into ad groups.
pub struct SegmentationEngine {
    backend: Box<dyn SimilarityBackend>,
    /// Pairs at or above this similarity cluster together.
    min_similarity: f64,
    /// Hard cap per ad group; larger clusters split.
    max_group_size: usize,
}

impl SegmentationEngine {
    pub fn new(
        backend: Box<dyn SimilarityBackend>,
        min_similarity: f64,
        max_group_size: usize,
    ) -> Self {
        Self {
            backend,
            min_similarity,
            max_group_size,
        }
    }

    /// Partition the scored keywords into ad groups.
    ///
    /// An empty input is a valid, reportable outcome and yields an empty
    /// group list.
    #[instrument(skip_all, fields(keywords = keywords.len()))]
    pub fn segment(&self, keywords: Vec<ScoredKeyword>) -> Vec<AdGroup> {
        if keywords.is_empty() {
            return Vec::new();
        }

        let clusters = self.cluster(&keywords);

        // Clusters with company become theme groups; singletons pool into
        // the catch-all.
        let mut themed: Vec<Vec<usize>> = Vec::new();
        let mut leftovers: Vec<usize> = Vec::new();
        for cluster in clusters {
            if cluster.len() >= 2 {
                themed.push(cluster);
            } else {
                leftovers.extend(cluster);
            }
        }

        // Deterministic cluster order: biggest anchor volume first, then
        // lexical by anchor term.
        for cluster in &mut themed {
            sort_by_volume(cluster, &keywords);
        }
        themed.sort_by(|a, b| {
            let anchor_a = &keywords[a[0]];
            let anchor_b = &keywords[b[0]];
            anchor_b
                .volume_or_zero()
                .cmp(&anchor_a.volume_or_zero())
                .then_with(|| anchor_a.keyword.term.cmp(&anchor_b.keyword.term))
        });
        sort_by_volume(&mut leftovers, &keywords);

        let mut groups = Vec::new();
        for cluster in themed {
            let theme = keywords[cluster[0]].keyword.display_text.clone();
            self.emit_groups(&cluster, &keywords, &theme, &mut groups);
        }
        if !leftovers.is_empty() {
            self.emit_groups(&leftovers, &keywords, CATCH_ALL_NAME, &mut groups);
        }

        debug!(groups = groups.len(), "segmentation complete");
        groups
    }

    /// Union-find agglomeration over all pairs at or above the threshold.
    fn cluster(&self, keywords: &[ScoredKeyword]) -> Vec<Vec<usize>> {
        let n = keywords.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn find(parent: &mut [usize], i: usize) -> usize {
            if parent[i] != i {
                parent[i] = find(parent, parent[i]);
            }
            parent[i]
        }

        fn union(parent: &mut [usize], i: usize, j: usize) {
            let pi = find(parent, i);
            let pj = find(parent, j);
            if pi != pj {
                parent[pi] = pj;
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                let score = self.backend.similarity(
                    &keywords[i].keyword.display_text,
                    &keywords[j].keyword.display_text,
                );
                if score >= self.min_similarity {
                    union(&mut parent, i, j);
                }
            }
        }

        // Group by root, keyed by smallest member index for determinism.
        let mut clusters: std::collections::BTreeMap<usize, Vec<usize>> =
            std::collections::BTreeMap::new();
        for i in 0..n {
            let root = find(&mut parent, i);
            clusters.entry(root).or_default().push(i);
        }

        clusters.into_values().collect()
    }

    /// Emit one or more capped ad groups for a volume-ordered cluster,
    /// numbering the split groups after the first.
    fn emit_groups(
        &self,
        ordered: &[usize],
        keywords: &[ScoredKeyword],
        theme: &str,
        groups: &mut Vec<AdGroup>,
    ) {
        for (chunk_idx, chunk) in ordered.chunks(self.max_group_size).enumerate() {
            let name = if chunk_idx == 0 {
                theme.to_string()
            } else {
                format!("{theme} {}", chunk_idx + 1)
            };

            let members = assign_match_types(chunk, keywords);
            groups.push(AdGroup {
                id: AdGroupId::new(),
                name,
                theme_label: theme.to_string(),
                members,
            });
        }
    }
}

/// Sort member indices by descending volume, tie-breaking on term so the
/// output is stable. Unset volume sorts last.
fn sort_by_volume(members: &mut [usize], keywords: &[ScoredKeyword]) {
    members.sort_by(|&a, &b| {
        keywords[b]
            .volume_or_zero()
            .cmp(&keywords[a].volume_or_zero())
            .then_with(|| keywords[a].keyword.term.cmp(&keywords[b].keyword.term))
    });
}

/// Fixed three-tier match-type policy over a volume-ordered chunk: the
/// single highest-volume keyword is exact, the next tier (one third of the
/// remainder, at least one) is phrase, the rest broad.
fn assign_match_types(ordered: &[usize], keywords: &[ScoredKeyword]) -> Vec<AdGroupMember> {
    let n = ordered.len();
    let phrase_count = if n > 1 { ((n - 1) / 3).max(1) } else { 0 };

    ordered
        .iter()
        .enumerate()
        .map(|(rank, &idx)| {
            let match_type = if rank == 0 {
                MatchType::Exact
            } else if rank <= phrase_count {
                MatchType::Phrase
            } else {
                MatchType::Broad
            };
            AdGroupMember {
                keyword: keywords[idx].clone(),
                match_type,
            }
        })
        .collect()
}

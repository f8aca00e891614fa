//! Campaign deliverable generators.
//!
//! Pure string builders over a [`PipelineResult`] — no file I/O here. The
//! CLI (or any other caller) decides where the output goes. Unset metrics
//! render as empty cells, never as zero.

use std::fmt::Write as _;

use semplan_shared::PipelineResult;

/// Campaign keyword table as CSV: one row per ad-group member.
pub fn generate_keyword_table(result: &PipelineResult) -> String {
    let mut out = String::from(
        "ad_group,keyword,match_type,volume,competition,roi_potential,estimated_cpc,bid_recommendation,low_volume\n",
    );

    for group in &result.ad_groups {
        for member in &group.members {
            let kw = &member.keyword;
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{:.2},{:.2},{}",
                csv_field(&group.name),
                csv_field(&kw.keyword.display_text),
                member.match_type.as_str(),
                kw.keyword.volume.map(|v| v.to_string()).unwrap_or_default(),
                kw.keyword.competition.map(|c| c.as_str()).unwrap_or(""),
                kw.roi_potential.as_str(),
                kw.estimated_cpc,
                kw.bid_recommendation,
                kw.low_volume,
            );
        }
    }

    out
}

/// Theme list, one line per distinct theme in group order.
pub fn generate_theme_list(result: &PipelineResult) -> String {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = String::new();

    for group in &result.ad_groups {
        if seen.insert(group.theme_label.clone()) {
            out.push_str(&group.theme_label);
            out.push('\n');
        }
    }

    out
}

/// CPC recommendation table as CSV: one row per keyword, highest
/// recommended bid first.
pub fn generate_cpc_recommendations(result: &PipelineResult) -> String {
    let mut rows: Vec<_> = result
        .ad_groups
        .iter()
        .flat_map(|g| &g.members)
        .map(|m| &m.keyword)
        .collect();
    rows.sort_by(|a, b| {
        b.bid_recommendation
            .total_cmp(&a.bid_recommendation)
            .then_with(|| a.keyword.term.cmp(&b.keyword.term))
    });

    let mut out = String::from("keyword,estimated_cpc,bid_recommendation,cpc_low,cpc_high\n");
    for kw in rows {
        let _ = writeln!(
            out,
            "{},{:.2},{:.2},{},{}",
            csv_field(&kw.keyword.display_text),
            kw.estimated_cpc,
            kw.bid_recommendation,
            kw.keyword
                .cpc_low
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default(),
            kw.keyword
                .cpc_high
                .map(|v| format!("{v:.2}"))
                .unwrap_or_default(),
        );
    }

    out
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use semplan_shared::{
        AdGroup, AdGroupId, AdGroupMember, CanonicalKeyword, CompetitionLevel, MatchType,
        NormalizedTerm, RoiPotential, ScoredKeyword, SourceId, StageCounts,
    };

    fn scored(text: &str, volume: Option<u64>, bid: f64) -> ScoredKeyword {
        ScoredKeyword {
            keyword: CanonicalKeyword {
                term: NormalizedTerm::new(text.to_lowercase()),
                display_text: text.to_string(),
                volume,
                cpc_low: volume.map(|_| 1.0),
                cpc_high: volume.map(|_| 3.0),
                competition: volume.map(|_| CompetitionLevel::Medium),
                sources: BTreeSet::from([SourceId::SerpSuggest]),
                confidence: 0.6,
            },
            roi_potential: RoiPotential::Medium,
            estimated_cpc: 2.0,
            bid_recommendation: bid,
            low_volume: volume.is_none(),
        }
    }

    fn result() -> PipelineResult {
        PipelineResult {
            ad_groups: vec![
                AdGroup {
                    id: AdGroupId::new(),
                    name: "Running Shoes".into(),
                    theme_label: "Running Shoes".into(),
                    members: vec![
                        AdGroupMember {
                            keyword: scored("running shoes", Some(5000), 2.5),
                            match_type: MatchType::Exact,
                        },
                        AdGroupMember {
                            keyword: scored("buy running shoes, fast", Some(1000), 1.5),
                            match_type: MatchType::Phrase,
                        },
                    ],
                },
                AdGroup {
                    id: AdGroupId::new(),
                    name: "Other".into(),
                    theme_label: "Other".into(),
                    members: vec![AdGroupMember {
                        keyword: scored("yoga mat", None, 2.0),
                        match_type: MatchType::Exact,
                    }],
                },
            ],
            counts: StageCounts::default(),
        }
    }

    #[test]
    fn keyword_table_has_header_and_all_rows() {
        let csv = generate_keyword_table(&result());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("ad_group,keyword,match_type"));
        assert!(lines[1].contains("exact"));
    }

    #[test]
    fn unset_metrics_render_as_empty_cells() {
        let csv = generate_keyword_table(&result());
        let yoga_row = csv.lines().find(|l| l.contains("yoga mat")).expect("row");
        // volume and competition columns are empty, not zero.
        assert!(yoga_row.contains("yoga mat,exact,,,"));
        assert!(yoga_row.ends_with("true"));
    }

    #[test]
    fn embedded_commas_are_quoted() {
        let csv = generate_keyword_table(&result());
        assert!(csv.contains("\"buy running shoes, fast\""));
    }

    #[test]
    fn theme_list_is_deduplicated_in_order() {
        let themes = generate_theme_list(&result());
        assert_eq!(themes, "Running Shoes\nOther\n");
    }

    #[test]
    fn cpc_table_sorts_by_bid_descending() {
        let csv = generate_cpc_recommendations(&result());
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].starts_with("running shoes"));
        assert!(lines[2].starts_with("yoga mat"));
    }

    #[test]
    fn cpc_table_leaves_unobserved_bounds_empty() {
        let csv = generate_cpc_recommendations(&result());
        let yoga_row = csv.lines().find(|l| l.starts_with("yoga mat")).expect("row");
        assert!(yoga_row.ends_with(",,"));
    }
}

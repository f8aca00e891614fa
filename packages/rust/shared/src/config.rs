//! Application configuration for SemPlan.
//!
//! User config lives at `~/.semplan/semplan.toml` (or an explicit path).
//! CLI flags override config file values, which override defaults. The
//! pipeline itself only sees the parsed [`PipelineConfig`], never the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SemPlanError};
use crate::types::SourceId;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "semplan.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".semplan";

// ---------------------------------------------------------------------------
// Config structs (matching semplan.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// `[project]` — what to plan for.
    #[serde(default)]
    pub project: ProjectConfig,

    /// `[budgets]` — campaign budgets.
    #[serde(default)]
    pub budgets: AdBudgets,

    /// `[settings]` — evaluation and collection knobs.
    #[serde(default)]
    pub settings: ProjectSettings,

    /// `[tuning]` — pipeline tuning parameters.
    #[serde(default)]
    pub tuning: PipelineTuning,

    /// `[trust_weights]` — per-source trust weights for metric merging.
    #[serde(default)]
    pub trust_weights: TrustWeights,
}

/// `[project]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Brand website URL (required for a valid run).
    #[serde(default)]
    pub brand_url: String,

    /// Competitor website URLs.
    #[serde(default)]
    pub competitor_urls: Vec<String>,

    /// Service locations used as keyword modifiers ("boston", "near me").
    #[serde(default)]
    pub service_locations: Vec<String>,

    /// Seed keywords fed to the seed-list collector.
    #[serde(default)]
    pub seed_keywords: Vec<String>,
}

/// `[budgets]` section. Monthly budgets per campaign type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdBudgets {
    #[serde(default = "default_budget")]
    pub search: f64,
    #[serde(default = "default_budget")]
    pub shopping: f64,
    #[serde(default = "default_budget")]
    pub pmax: f64,
}

impl Default for AdBudgets {
    fn default() -> Self {
        Self {
            search: default_budget(),
            shopping: default_budget(),
            pmax: default_budget(),
        }
    }
}

impl AdBudgets {
    pub fn total(&self) -> f64 {
        self.search + self.shopping + self.pmax
    }
}

fn default_budget() -> f64 {
    1000.0
}

/// `[settings]` section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Assumed conversion rate used for bid math.
    #[serde(default = "default_conversion_rate")]
    pub assumed_conversion_rate: f64,

    /// Keywords below this volume are flagged low-volume (never dropped).
    #[serde(default = "default_min_volume")]
    pub min_search_volume_threshold: u64,

    /// Target cost-per-acquisition; derived from budgets when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cpa: Option<f64>,

    /// Hard cap on ad-group size; over-large clusters are split.
    #[serde(default = "default_max_group_size")]
    pub max_keywords_per_ad_group: usize,

    /// Cap on search-suggestion queries per run.
    #[serde(default = "default_max_serp_queries")]
    pub max_serp_queries: usize,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            assumed_conversion_rate: default_conversion_rate(),
            min_search_volume_threshold: default_min_volume(),
            target_cpa: None,
            max_keywords_per_ad_group: default_max_group_size(),
            max_serp_queries: default_max_serp_queries(),
        }
    }
}

fn default_conversion_rate() -> f64 {
    0.02
}
fn default_min_volume() -> u64 {
    500
}
fn default_max_group_size() -> usize {
    20
}
fn default_max_serp_queries() -> usize {
    10
}

/// `[tuning]` section — pipeline tuning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTuning {
    /// Relevance multiplier applied per candidate transformation step.
    #[serde(default = "default_relevance_decay")]
    pub relevance_decay: f64,

    /// Candidates below this relevance are filtered out.
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,

    /// Token-count window for surviving candidates.
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Cap on expansion output per seed candidate.
    #[serde(default = "default_max_expansions")]
    pub max_expansions_per_seed: usize,

    /// Similarity threshold for ad-group clustering.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    /// ROI score at or above which a keyword is classified High.
    #[serde(default = "default_roi_high")]
    pub roi_high_threshold: f64,

    /// ROI score at or above which a keyword is classified Medium.
    #[serde(default = "default_roi_medium")]
    pub roi_medium_threshold: f64,

    /// Multiplier used to derive a missing CPC bound from the present one.
    #[serde(default = "default_cpc_fallback_factor")]
    pub cpc_fallback_factor: f64,

    /// Negative keywords; candidates matching these (exactly or as a token)
    /// are filtered out. Extends the built-in junk-word list.
    #[serde(default)]
    pub negative_keywords: Vec<String>,
}

impl Default for PipelineTuning {
    fn default() -> Self {
        Self {
            relevance_decay: default_relevance_decay(),
            min_relevance: default_min_relevance(),
            min_tokens: default_min_tokens(),
            max_tokens: default_max_tokens(),
            max_expansions_per_seed: default_max_expansions(),
            min_similarity: default_min_similarity(),
            roi_high_threshold: default_roi_high(),
            roi_medium_threshold: default_roi_medium(),
            cpc_fallback_factor: default_cpc_fallback_factor(),
            negative_keywords: Vec::new(),
        }
    }
}

fn default_relevance_decay() -> f64 {
    0.85
}
fn default_min_relevance() -> f64 {
    0.3
}
fn default_min_tokens() -> usize {
    2
}
fn default_max_tokens() -> usize {
    6
}
fn default_max_expansions() -> usize {
    10
}
fn default_min_similarity() -> f64 {
    0.4
}
fn default_roi_high() -> f64 {
    0.6
}
fn default_roi_medium() -> f64 {
    0.35
}
fn default_cpc_fallback_factor() -> f64 {
    1.8
}

/// `[trust_weights]` section — per-source trust for metric merge priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrustWeights {
    #[serde(default = "default_trust_brand")]
    pub brand_site: f64,
    #[serde(default = "default_trust_competitor")]
    pub competitor_site: f64,
    #[serde(default = "default_trust_serp")]
    pub serp_suggest: f64,
    #[serde(default = "default_trust_serp")]
    pub serp_related: f64,
    #[serde(default = "default_trust_seed")]
    pub seed_list: f64,
}

impl Default for TrustWeights {
    fn default() -> Self {
        Self {
            brand_site: default_trust_brand(),
            competitor_site: default_trust_competitor(),
            serp_suggest: default_trust_serp(),
            serp_related: default_trust_serp(),
            seed_list: default_trust_seed(),
        }
    }
}

impl TrustWeights {
    /// Trust weight configured for the given source.
    pub fn weight(&self, source: SourceId) -> f64 {
        match source {
            SourceId::BrandSite => self.brand_site,
            SourceId::CompetitorSite => self.competitor_site,
            SourceId::SerpSuggest => self.serp_suggest,
            SourceId::SerpRelated => self.serp_related,
            SourceId::SeedList => self.seed_list,
        }
    }
}

fn default_trust_brand() -> f64 {
    0.9
}
fn default_trust_competitor() -> f64 {
    0.7
}
fn default_trust_serp() -> f64 {
    0.6
}
fn default_trust_seed() -> f64 {
    0.5
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, parsed and validated)
// ---------------------------------------------------------------------------

/// Runtime pipeline configuration — the parsed form every stage consumes.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub brand_url: Url,
    pub competitor_urls: Vec<Url>,
    pub service_locations: Vec<String>,
    pub seed_keywords: Vec<String>,
    pub budgets: AdBudgets,
    pub settings: ProjectSettings,
    pub tuning: PipelineTuning,
    pub trust_weights: TrustWeights,
}

impl PipelineConfig {
    /// Parse an [`AppConfig`] into a runtime config. URL parsing happens
    /// here; range validation happens in [`PipelineConfig::validate`].
    pub fn from_app(app: &AppConfig) -> Result<Self> {
        if app.project.brand_url.trim().is_empty() {
            return Err(SemPlanError::config("project.brand_url is required"));
        }

        let brand_url = Url::parse(&app.project.brand_url).map_err(|e| {
            SemPlanError::config(format!("invalid brand_url {:?}: {e}", app.project.brand_url))
        })?;

        let mut competitor_urls = Vec::with_capacity(app.project.competitor_urls.len());
        for raw in &app.project.competitor_urls {
            let url = Url::parse(raw).map_err(|e| {
                SemPlanError::config(format!("invalid competitor_url {raw:?}: {e}"))
            })?;
            competitor_urls.push(url);
        }

        let config = Self {
            brand_url,
            competitor_urls,
            service_locations: app.project.service_locations.clone(),
            seed_keywords: app.project.seed_keywords.clone(),
            budgets: app.budgets,
            settings: app.settings,
            tuning: app.tuning.clone(),
            trust_weights: app.trust_weights,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges. Fatal before any stage runs.
    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;
        let t = &self.tuning;

        if self.budgets.search < 0.0 || self.budgets.shopping < 0.0 || self.budgets.pmax < 0.0 {
            return Err(SemPlanError::config("budgets must be non-negative"));
        }
        if !(s.assumed_conversion_rate > 0.0 && s.assumed_conversion_rate <= 1.0) {
            return Err(SemPlanError::config(
                "assumed_conversion_rate must be in (0, 1]",
            ));
        }
        if s.target_cpa.is_some_and(|cpa| cpa <= 0.0) {
            return Err(SemPlanError::config("target_cpa must be positive"));
        }
        if s.max_keywords_per_ad_group == 0 {
            return Err(SemPlanError::config(
                "max_keywords_per_ad_group must be at least 1",
            ));
        }
        if !(t.relevance_decay > 0.0 && t.relevance_decay < 1.0) {
            return Err(SemPlanError::config("relevance_decay must be in (0, 1)"));
        }
        if !(0.0..=1.0).contains(&t.min_relevance) {
            return Err(SemPlanError::config("min_relevance must be in [0, 1]"));
        }
        if t.min_tokens == 0 || t.min_tokens > t.max_tokens {
            return Err(SemPlanError::config(
                "token window requires 1 <= min_tokens <= max_tokens",
            ));
        }
        if !(0.0..=1.0).contains(&t.min_similarity) {
            return Err(SemPlanError::config("min_similarity must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&t.roi_medium_threshold)
            || !(0.0..=1.0).contains(&t.roi_high_threshold)
            || t.roi_medium_threshold > t.roi_high_threshold
        {
            return Err(SemPlanError::config(
                "ROI thresholds require 0 <= medium <= high <= 1",
            ));
        }
        if t.cpc_fallback_factor <= 1.0 {
            return Err(SemPlanError::config(
                "cpc_fallback_factor must be greater than 1",
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.semplan/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SemPlanError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.semplan/semplan.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does
/// not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SemPlanError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SemPlanError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SemPlanError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SemPlanError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SemPlanError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

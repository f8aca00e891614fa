//! Shared types, error model, and configuration for SemPlan.
//!
//! This crate is the foundation depended on by all other SemPlan crates.
//! It provides:
//! - [`SemPlanError`] — the unified error type
//! - Domain types ([`RawObservation`], [`CandidateKeyword`],
//!   [`CanonicalKeyword`], [`ScoredKeyword`], [`AdGroup`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AdBudgets, AppConfig, PipelineConfig, PipelineTuning, ProjectConfig, ProjectSettings,
    TrustWeights, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, SemPlanError};
pub use types::{
    AdGroup, AdGroupId, AdGroupMember, CandidateKeyword, CanonicalKeyword, CompetitionLevel,
    MatchType, NormalizedTerm, PipelineResult, RawObservation, RoiPotential, ScoredKeyword,
    SourceId, SourceKind, StageCount, StageCounts,
};

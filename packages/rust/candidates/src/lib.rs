//! Per-source candidate processing: generation, relevance filtering, and
//! controlled expansion.
//!
//! These three stages run once per source, in order, on that source's raw
//! observations. Each source's candidate list is private until consolidation
//! merges them — nothing here looks across sources.

pub mod expansion;
pub mod filter;
pub mod generator;

pub use expansion::{ExpansionBackend, ExpansionEngine, LexicalExpansion};
pub use filter::RelevanceFilter;
pub use generator::{CandidateGenerator, GeneratorContext};

//! Pipeline orchestration for SemPlan.
//!
//! Wires the collectors and processing stages into the end-to-end keyword
//! pipeline. See [`pipeline::run`] for the entry point.

pub mod pipeline;

pub use pipeline::{ProgressReporter, SilentProgress, run};

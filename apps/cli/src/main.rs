//! SemPlan CLI — keyword intelligence for search campaigns.
//!
//! Collects keyword observations from configured sources, runs the
//! consolidation/scoring/segmentation pipeline, and writes campaign
//! deliverables.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

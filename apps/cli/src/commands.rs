//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use semplan_collectors::{MetricsCache, default_collectors};
use semplan_core::pipeline::{ProgressReporter, run as run_pipeline};
use semplan_shared::{
    AppConfig, PipelineConfig, PipelineResult, config_dir, init_config, load_config,
    load_config_from,
};

/// Cache TTL for collector query results.
const CACHE_TTL_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SemPlan — keyword intelligence for search campaigns.
#[derive(Parser)]
#[command(
    name = "semplan",
    version,
    about = "Discover, score, and group advertising keywords into campaign structures.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the keyword pipeline and write campaign deliverables.
    Plan {
        /// Config file path (defaults to ~/.semplan/semplan.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory for deliverables.
        #[arg(short, long, default_value = "outputs")]
        out: PathBuf,

        /// Extra seed keywords, in addition to the configured ones.
        #[arg(long)]
        seed: Vec<String>,
    },

    /// Check a config file without running anything.
    Validate {
        /// Config file path (defaults to ~/.semplan/semplan.toml).
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "semplan=info",
        1 => "semplan=debug",
        _ => "semplan=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Plan { config, out, seed } => cmd_plan(config.as_deref(), &out, seed).await,
        Command::Validate { config } => cmd_validate(config.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

async fn cmd_plan(config_path: Option<&Path>, out: &Path, extra_seeds: Vec<String>) -> Result<()> {
    let mut app = load_app_config(config_path)?;
    app.project.seed_keywords.extend(extra_seeds);
    let config = PipelineConfig::from_app(&app)?;

    let cache_path = config_dir()?.join("cache").join("metrics.json");
    let cache = MetricsCache::open(cache_path, CACHE_TTL_HOURS);
    let mut collectors = default_collectors(cache)?;

    let progress = SpinnerProgress::new();
    let result = run_pipeline(&config, &mut collectors, &progress).await?;
    progress.finish();

    write_deliverables(&result, out)?;
    print_summary(&result);

    Ok(())
}

/// Write the three deliverable files into the output directory.
fn write_deliverables(result: &PipelineResult, out: &Path) -> Result<()> {
    std::fs::create_dir_all(out)?;

    let files = [
        ("keywords.csv", semplan_deliverables::generate_keyword_table(result)),
        ("themes.txt", semplan_deliverables::generate_theme_list(result)),
        (
            "cpc_recommendations.csv",
            semplan_deliverables::generate_cpc_recommendations(result),
        ),
    ];

    for (name, content) in files {
        let path = out.join(name);
        std::fs::write(&path, content)?;
        info!(path = %path.display(), "deliverable written");
    }

    Ok(())
}

fn print_summary(result: &PipelineResult) {
    let counts = &result.counts;

    println!("Pipeline summary");
    for (source, count) in &counts.collected {
        println!("  collected    {source}: {count}");
    }
    for (name, count) in [
        ("generation", counts.generation),
        ("filtering", counts.filtering),
        ("expansion", counts.expansion),
        ("consolidation", counts.consolidation),
        ("evaluation", counts.evaluation),
        ("segmentation", counts.segmentation),
    ] {
        println!(
            "  {name:<12} {} -> {} ({} dropped)",
            count.input,
            count.output,
            count.dropped()
        );
    }
    println!(
        "  ad groups    {} ({} keywords)",
        result.ad_groups.len(),
        result.keyword_count()
    );
}

// ---------------------------------------------------------------------------
// validate / config
// ---------------------------------------------------------------------------

fn cmd_validate(config_path: Option<&Path>) -> Result<()> {
    let app = load_app_config(config_path)?;
    PipelineConfig::from_app(&app)?;
    println!("Configuration OK");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| eyre!("failed to render config: {e}"))?;
    println!("{rendered}");
    Ok(())
}

fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Spinner progress
// ---------------------------------------------------------------------------

/// Reports pipeline phases on an indicatif spinner.
struct SpinnerProgress {
    bar: ProgressBar,
}

impl SpinnerProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("valid progress template"),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for SpinnerProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn source_collected(&self, label: &str, count: usize) {
        self.bar.println(format!("  {label}: {count} observations"));
    }

    fn done(&self, _result: &PipelineResult) {}
}

//! Docsweep main entry point
//!
//! This is the command-line interface for the Docsweep documentation crawler.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use docsweep::config::{load_config_with_hash, validate, Config, CrawlMode};
use docsweep::crawler::{crawl_with, CrawlOptions};
use docsweep::output::print_statistics;
use docsweep::CancelFlag;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Docsweep: a documentation-site crawler
///
/// Docsweep walks an API documentation site from a seed URL, re-fetches
/// client-rendered pages through headless Chromium, and writes one JSON
/// record and one text file per extracted page.
#[derive(Parser, Debug)]
#[command(name = "docsweep")]
#[command(version = "1.0.0")]
#[command(about = "A documentation-site crawler", long_about = None)]
struct Cli {
    /// Seed URL; overrides the seed in the configuration file
    #[arg(value_name = "SEED")]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of successfully extracted pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum link-following depth from the seeds
    #[arg(long)]
    max_depth: Option<u32>,

    /// Delay between fetches in sequential mode, in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Maximum pages in flight in concurrent mode
    #[arg(long)]
    concurrency: Option<u32>,

    /// Scheduling mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<String>,

    /// Re-fetch client-rendered pages through headless Chromium
    #[arg(long)]
    render: bool,

    /// Render every page, not only those that look client-rendered
    #[arg(long)]
    force_render: bool,

    /// Named browser profile passed to the rendering backend
    #[arg(long, value_name = "NAME")]
    auth_profile: Option<String>,

    /// Validate the configuration and exit without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Sequential,
    Concurrent,
}

impl From<ModeArg> for CrawlMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Sequential => CrawlMode::Sequential,
            ModeArg::Concurrent => CrawlMode::Concurrent,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (mut config, config_hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, Some(hash))
        }
        None => (Config::default(), None),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, config_hash, cli.force_render).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docsweep=info,warn"),
            1 => EnvFilter::new("docsweep=debug,info"),
            2 => EnvFilter::new("docsweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Command-line values win over the configuration file
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(seed) = &cli.seed {
        config.crawler.seed = seed.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(delay) = cli.delay {
        config.crawler.delay_ms = delay;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
        config.render.max_sessions = config.render.max_sessions.min(concurrency.max(1));
    }
    if let Some(mode) = cli.mode {
        config.crawler.mode = mode.into();
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
    if cli.render || cli.force_render {
        config.render.enabled = true;
    }
    if let Some(profile) = &cli.auth_profile {
        config.render.auth_profile = Some(profile.clone());
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Docsweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", config.crawler.seed);
    println!("  Mode: {:?}", config.crawler.mode);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max depth: {}", config.crawler.max_depth);
    match config.crawler.mode {
        CrawlMode::Sequential => println!("  Delay: {}ms", config.crawler.delay_ms),
        CrawlMode::Concurrent => println!("  Concurrency: {}", config.crawler.concurrency),
    }
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);

    println!("\nRendering:");
    println!("  Enabled: {}", config.render.enabled);
    if config.render.enabled {
        println!("  Max sessions: {}", config.render.max_sessions);
        if let Some(profile) = &config.render.auth_profile {
            println!("  Auth profile: {}", profile);
        }
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Shard limit: {} characters", config.output.shard_limit);

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: Option<String>,
    force_render: bool,
) -> anyhow::Result<()> {
    let cancel = CancelFlag::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing pages in flight");
            on_signal.cancel();
        }
    });

    let mut options = CrawlOptions::default()
        .with_cancel(cancel)
        .with_force_render(force_render);
    if let Some(hash) = config_hash {
        options = options.with_config_hash(hash);
    }

    let output_dir = config.output.directory.clone();
    let report = crawl_with(config, options).await.context("crawl failed")?;

    println!();
    print_statistics(&report.statistics);
    println!("\nTermination: {}", report.status);
    println!("Output written to: {}", output_dir);

    for failure in &report.write_errors {
        tracing::error!("Write failure: {}", failure);
    }

    if report.is_failure() {
        bail!("no pages were extracted");
    }

    Ok(())
}

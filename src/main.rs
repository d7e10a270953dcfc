//! vidsift main entry point
//!
//! This is the command-line interface for the vidsift listing crawler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use vidsift::config::{load_config_with_hash, validate, CategoryEntry, Config};
use vidsift::crawler::{build_http_client, BatchRunner};
use vidsift::output::{print_run_report, CsvSink};
use vidsift::ConfigError;

/// vidsift: a like-rate filter for video rankings
///
/// vidsift pages through category rankings and the popular feed, keeps the
/// entries whose like rate clears the configured threshold, and exports them
/// as CSV ranked by like rate.
#[derive(Parser, Debug)]
#[command(name = "vidsift")]
#[command(version = "1.0.0")]
#[command(about = "A like-rate filter for video rankings", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl each category's ranking and write one CSV per category
    Ranking {
        /// Category name or slug to crawl (repeatable; all if omitted)
        #[arg(long = "category", value_name = "NAME")]
        categories: Vec<String>,

        /// Entries to keep per category
        #[arg(long)]
        target: Option<usize>,
    },

    /// Crawl the popular feed across several pages into one CSV
    Popular {
        /// Entries to keep
        #[arg(long)]
        target: Option<usize>,

        /// Highest page to request
        #[arg(long)]
        max_pages: Option<u32>,
    },

    /// List the category registry
    Categories,

    /// Print the effective configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(cli.config.as_deref())?;

    match cli.command {
        Command::Ranking { categories, target } => {
            handle_ranking(config, &categories, target).await?
        }
        Command::Popular { target, max_pages } => handle_popular(config, target, max_pages).await?,
        Command::Categories => handle_categories(&config),
        Command::CheckConfig => handle_check_config(&config),
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vidsift=info,warn"),
            1 => EnvFilter::new("vidsift=debug,info"),
            2 => EnvFilter::new("vidsift=trace,debug"),
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

fn load_effective_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using built-in defaults");
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Cancels the returned token on Ctrl-C
fn install_interrupt_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current page");
            token.cancel();
        }
    });

    cancel
}

fn resolve_categories(config: &Config, names: &[String]) -> anyhow::Result<Vec<CategoryEntry>> {
    if names.is_empty() {
        return Ok(config.categories.clone());
    }

    names
        .iter()
        .map(|name| {
            config
                .find_category(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownCategory(name.clone()).into())
        })
        .collect()
}

fn request_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.crawler.request_timeout)
}

/// Handles the ranking command: one crawl and one CSV per category
async fn handle_ranking(
    config: Config,
    names: &[String],
    target: Option<usize>,
) -> anyhow::Result<()> {
    let categories = resolve_categories(&config, names)?;
    let target = target.unwrap_or(config.crawler.target_per_category);

    tracing::info!(
        "Crawling {} categories, keeping up to {} entries each above a like rate of {}",
        categories.len(),
        target,
        config.crawler.quality_threshold
    );

    let client = build_http_client(&config.api, request_timeout(&config))?;
    let mut sink = CsvSink::new(&config.output.ranking_dir, config.api.content_url_base.clone());
    let runner = BatchRunner::new(config, client).with_cancellation(install_interrupt_handler());

    let removed = runner
        .clear_ranking_exports(target)
        .with_context(|| format!("Failed to prepare {}", sink.dir().display()))?;
    if removed > 0 {
        tracing::info!("Removed {} previous exports", removed);
    }

    let summary = runner.run_ranking(&categories, target, &mut sink).await?;

    println!();
    for run in &summary.runs {
        print_run_report(&run.name, &run.outcome);
        if let Some(export) = &run.export {
            println!("  Saved to {}", export.location);
        }
        println!();
    }

    println!("=== Ranking crawl complete ===");
    println!("  Succeeded: {} categories", summary.succeeded());
    println!("  Failed: {} categories", summary.failed());
    if summary.runs.len() < categories.len() {
        println!(
            "  Skipped: {} categories ({})",
            categories.len() - summary.runs.len(),
            if summary.aborted { "blocked" } else { "interrupted" }
        );
    }
    println!("  Output directory: {}", sink.dir().display());

    Ok(())
}

/// Handles the popular command: one multi-page crawl into one CSV
async fn handle_popular(
    config: Config,
    target: Option<usize>,
    max_pages: Option<u32>,
) -> anyhow::Result<()> {
    let target = target.unwrap_or(config.crawler.target_popular);
    let max_pages = max_pages.unwrap_or(config.crawler.max_pages);
    if target == 0 || max_pages == 0 {
        bail!("--target and --max-pages must be at least 1");
    }

    tracing::info!(
        "Crawling the popular feed for {} entries over at most {} pages",
        target,
        max_pages
    );

    let client = build_http_client(&config.api, request_timeout(&config))?;
    let mut sink = CsvSink::new(&config.output.popular_dir, config.api.content_url_base.clone());
    let runner = BatchRunner::new(config, client).with_cancellation(install_interrupt_handler());

    let run = runner.run_popular(target, max_pages, &mut sink).await?;

    println!();
    print_run_report(&run.name, &run.outcome);
    match &run.export {
        Some(export) => println!("  Saved to {}", export.location),
        None => println!("  Nothing saved"),
    }

    Ok(())
}

/// Handles the categories command: lists the registry
fn handle_categories(config: &Config) {
    println!("Categories ({}):", config.categories.len());
    for category in &config.categories {
        match &category.slug {
            Some(slug) => println!("  {:>4}  {} ({})", category.id, category.name, slug),
            None => println!("  {:>4}  {}", category.id, category.name),
        }
    }
}

/// Handles the check-config command: shows the effective configuration
fn handle_check_config(config: &Config) {
    println!("=== vidsift configuration ===\n");

    println!("Crawler:");
    println!("  Quality threshold: {}", config.crawler.quality_threshold);
    println!("  Target per category: {}", config.crawler.target_per_category);
    println!("  Target (popular): {}", config.crawler.target_popular);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Max empty pages: {}", config.crawler.max_empty_pages);
    println!("  Page size: {}", config.crawler.page_size);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  Delay between requests: {:.1}-{:.1}s",
        config.crawler.delay_min, config.crawler.delay_max
    );
    println!(
        "  Retries: {} (backoff {:.1}s)",
        config.crawler.fetch_retries, config.crawler.retry_backoff
    );
    println!("  Abort on blocked: {}", config.crawler.abort_on_blocked);

    println!("\nAPI:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Ranking path: {}", config.api.ranking_path);
    println!("  Popular path: {}", config.api.popular_path);
    println!("  Content URL base: {}", config.api.content_url_base);
    println!("  User agent: {}", config.api.user_agent);
    println!("  Referer: {}", config.api.referer);

    println!("\nOutput:");
    println!("  Ranking directory: {}", config.output.ranking_dir);
    println!("  Popular directory: {}", config.output.popular_dir);
    println!("  CSV prefix: {}", config.output.csv_prefix);

    println!("\nCategories: {}", config.categories.len());

    println!("\n✓ Configuration is valid");
}

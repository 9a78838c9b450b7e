//! Sumi-Census main entry point
//!
//! This is the command-line interface for the Sumi-Census word crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sumi_census::clock::SystemClock;
use sumi_census::config::{load_config_with_hash, Config};
use sumi_census::output::write_result;
use sumi_census::parser::SitemapParserFactory;
use sumi_census::profiler::{ProfiledWebCrawler, Profiler, ProfilingPageParserFactory};
use sumi_census::url::PatternSet;
use sumi_census::{Coordinator, WebCrawler};
use tracing_subscriber::EnvFilter;

/// Sumi-Census: a deadline-bounded concurrent word census
///
/// Sumi-Census crawls a set of linked pages from the configured start pages,
/// counts the words on every page it reaches before the timeout, and appends
/// a profile of where the time went.
#[derive(Parser, Debug)]
#[command(name = "sumi-census")]
#[command(version = "1.0.0")]
#[command(about = "A deadline-bounded concurrent word census", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_census=info,warn"),
            1 => EnvFilter::new("sumi_census=debug,info"),
            2 => EnvFilter::new("sumi_census=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Census Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Timeout: {}s", config.crawler.timeout_seconds);
    println!("  Parallelism: {}", config.crawler.parallelism);

    println!("\nStart Pages ({}):", config.crawler.start_pages.len());
    for page in &config.crawler.start_pages {
        println!("  - {}", page);
    }

    println!("\nIgnored URL Patterns ({}):", config.crawler.ignored_urls.len());
    for pattern in &config.crawler.ignored_urls {
        println!("  - {}", pattern);
    }

    println!(
        "\nIgnored Word Patterns ({}):",
        config.crawler.ignored_words.len()
    );
    for pattern in &config.crawler.ignored_words {
        println!("  - {}", pattern);
    }

    println!("\nDeclared Pages: {}", config.pages.len());

    println!("\nOutput:");
    println!(
        "  Result: {}",
        config.output.result_path.as_deref().unwrap_or("<stdout>")
    );
    println!(
        "  Profile: {}",
        config.output.profile_path.as_deref().unwrap_or("<stdout>")
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let clock = Arc::new(SystemClock);
    let profiler = Profiler::new(clock.clone());

    let ignored_words = PatternSet::compile(&config.crawler.ignored_words)?;
    let sitemap = SitemapParserFactory::new(&config.pages, &ignored_words);
    tracing::info!("Serving {} declared pages", sitemap.len());

    let parser_factory = ProfilingPageParserFactory::new(profiler.clone(), sitemap)?;
    let coordinator = Coordinator::new(&config.crawler, Arc::new(parser_factory), clock)?;
    let crawler: ProfiledWebCrawler<Coordinator> = profiler.wrap(coordinator)?;

    tracing::info!(
        "Starting crawl of {} start page(s) with parallelism {}",
        config.crawler.start_pages.len(),
        crawler.max_parallelism()
    );

    let outcome = crawler
        .crawl(&config.crawler.start_pages)
        .await
        .context("crawl failed")?;

    write_result(&outcome, config.output.result_path.as_deref().map(Path::new))
        .context("failed to write crawl result")?;

    match config.output.profile_path.as_deref() {
        Some(path) => profiler
            .write_report_to_path(Path::new(path))
            .with_context(|| format!("failed to append profile to {}", path))?,
        None => profiler.write_report(&mut std::io::stdout().lock())?,
    }

    Ok(())
}

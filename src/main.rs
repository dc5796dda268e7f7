//! Shelf-Scrape main entry point
//!
//! This is the command-line interface for the Shelf-Scrape catalog crawler.

use anyhow::Context;
use clap::Parser;
use shelf_scrape::config::{load_config_with_hash, Config};
use shelf_scrape::crawler::Coordinator;
use shelf_scrape::output::{load_statistics, print_report, print_statistics};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shelf-Scrape: a book catalog crawler
///
/// Shelf-Scrape walks every category of a paginated book catalog, assigns
/// each book a reference country, and writes the records to two CSV files
/// and a SQLite table keyed by product URL.
#[derive(Parser, Debug)]
#[command(name = "shelf-scrape")]
#[command(version = "1.0.0")]
#[command(about = "A book catalog crawler", long_about = None)]
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
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the book database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_scrape=info,warn"),
            1 => EnvFilter::new("shelf_scrape=debug,info"),
            2 => EnvFilter::new("shelf_scrape=trace,debug"),
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

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Shelf-Scrape Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Start URL: {}", config.crawler.start_url);
    println!("  Countries URL: {}", config.crawler.countries_url);
    println!(
        "  Max concurrent requests: {}",
        config.crawler.max_concurrent_requests
    );
    println!(
        "  Max pages per category: {}",
        config.crawler.max_pages_per_category
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nDebug Archive:");
    if config.archive.enabled {
        println!("  Directory: {}", config.archive.directory);
        println!("  Strip prefix: {}", config.archive.strip_prefix);
    } else {
        println!("  Disabled");
    }

    println!("\nOutput:");
    println!("  Books CSV: {}", config.output.books_path);
    println!(
        "  Books with country CSV: {}",
        config.output.books_with_country_path
    );
    println!("  Database: {}", config.output.database_path);
    println!(
        "  Sink setup failures: {}",
        if config.output.isolate_sink_failures {
            "isolated"
        } else {
            "abort the crawl"
        }
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let path = Path::new(&config.output.database_path);
    println!("Database: {}\n", path.display());

    if !path.exists() {
        anyhow::bail!("database {} does not exist yet", path.display());
    }

    let stats = load_statistics(path)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting crawl at {}", config.crawler.start_url);

    let mut coordinator = Coordinator::new(config)?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match coordinator.run_until(shutdown).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

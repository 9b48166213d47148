//! Anteater main entry point
//!
//! This is the command-line interface for the Anteater crawler.

use anteater::config::{load_config_with_hash, Config};
use anteater::crawler::crawl;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Anteater: a polite, scope-restricted web crawler
///
/// Anteater crawls a fixed set of allowed domains, spacing requests to each
/// domain, skipping trap URLs and near-duplicate pages, and keeps its frontier
/// on disk so an interrupted crawl resumes where it stopped.
#[derive(Parser, Debug)]
#[command(name = "anteater")]
#[command(version = "1.0.0")]
#[command(about = "A polite, scope-restricted web crawler", long_about = None)]
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

    /// Discard the saved frontier and start again from the seeds
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    restart: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the saved frontier and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, cli.restart).await?;
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
            0 => EnvFilter::new("anteater=info,warn"),
            1 => EnvFilter::new("anteater=debug,info"),
            2 => EnvFilter::new("anteater=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Anteater Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!(
        "  Politeness interval: {}ms",
        config.crawler.politeness_interval
    );
    println!("  Time delay: {}ms", config.crawler.time_delay);
    println!("  Poll timeout: {}ms", config.crawler.poll_timeout);

    println!("\nContent Limits:");
    println!(
        "  Payload size: {}..={} bytes",
        config.content.min_content_size, config.content.max_content_size
    );
    println!(
        "  Minimum text length: {} chars",
        config.content.min_text_length
    );
    println!(
        "  Near-duplicate threshold: {} bits",
        config.content.near_duplicate_threshold
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nStorage:");
    println!("  Save file: {}", config.storage.save_file);

    println!(
        "\nAllowed Domains ({}):",
        config.scope.allowed_domains.len()
    );
    for domain in &config.scope.allowed_domains {
        println!("  - {}", domain);
    }

    if !config.scope.exceptions.is_empty() {
        println!("\nHost Exceptions ({}):", config.scope.exceptions.len());
        for exception in &config.scope.exceptions {
            println!("  - {}{}", exception.host, exception.path_prefix);
        }
    }

    println!("\nTrap Limits:");
    println!("  Max page depth: {}", config.scope.max_page_depth);
    println!(
        "  Max numeric segments: {}",
        config.scope.max_numeric_segments
    );
    println!(
        "  Blocked query params: {}",
        config.scope.blocked_query_params.len()
    );

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  * {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs",
        config.crawler.seeds.len()
    );

    Ok(())
}

/// Handles the --stats mode: shows statistics from the saved frontier
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use anteater::output::{load_statistics, print_statistics};
    use anteater::storage::open_store;
    use std::path::Path;

    let path = Path::new(&config.storage.save_file);
    if !path.exists() {
        return Err(format!("No saved frontier at {}", path.display()).into());
    }

    println!("Database: {}\n", path.display());

    // Open the database
    let store = open_store(path)?;

    // Load statistics
    let stats = load_statistics(&store)?;

    // Print statistics
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, restart: bool) -> Result<(), Box<dyn std::error::Error>> {
    if restart {
        tracing::info!("Starting crawl from seeds (discarding saved frontier)");
    } else {
        tracing::info!("Starting crawl (will resume from saved frontier if present)");
    }

    tracing::info!(
        "Allowed domains: {}, seeds: {}, workers: {}",
        config.scope.allowed_domains.len(),
        config.crawler.seeds.len(),
        config.crawler.workers
    );

    // Run the crawler
    match crawl(config, restart).await {
        Ok(report) => {
            tracing::info!("Crawl finished: {}", report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

//! Made-In main entry point
//!
//! This is the command-line interface for the Made-In developer crawler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use made_in::config::{load_config_with_hash, Config};
use made_in::crawler::{connect, CrawlOutcome};
use made_in::output::{generate_documents, load_statistics, print_statistics};
use made_in::state::Endpoint;
use made_in::storage::{JsonStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Made-In: developers and repositories by location
///
/// Made-In searches for developers living in a set of locations, collects
/// their notable repositories, and renders star rankings per developer and
/// per language.
#[derive(Parser, Debug)]
#[command(name = "made-in")]
#[command(version = "1.0.0")]
#[command(about = "Developers and repositories by location", long_about = None)]
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

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover developers by location
    Developers {
        /// Location to search (repeatable; defaults to the configured locations)
        #[arg(short, long = "location", value_name = "LOCATION")]
        locations: Vec<String>,

        /// Page to start the first location at
        #[arg(long, default_value_t = 1, conflicts_with = "resume")]
        page: u32,

        /// Continue an interrupted developer crawl
        #[arg(long, conflicts_with = "locations")]
        resume: bool,
    },

    /// Discover repositories of known developers
    Repositories {
        /// Developer to search (repeatable; defaults to every known developer)
        #[arg(short, long = "developer", value_name = "LOGIN")]
        developers: Vec<String>,

        /// Only search the ranked developers from the last document generation
        #[arg(long, conflicts_with = "developers")]
        rankers: bool,

        /// Page to start the first developer at
        #[arg(long, default_value_t = 1, conflicts_with = "resume")]
        page: u32,

        /// Continue an interrupted repository crawl
        #[arg(long, conflicts_with_all = ["developers", "rankers"])]
        resume: bool,
    },

    /// Generate the ranking and language documents
    Docs,

    /// Show statistics for the collected dataset
    Stats,

    /// Validate the configuration and show what would be crawled
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Developers {
            locations,
            page,
            resume,
        } => handle_developers(config, locations, page, resume).await,
        Command::Repositories {
            developers,
            rankers,
            page,
            resume,
        } => handle_repositories(config, developers, rankers, page, resume).await,
        Command::Docs => handle_docs(&config),
        Command::Stats => handle_stats(&config),
        Command::Check => handle_check(&config, &config_hash),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("made_in=info,warn"),
            1 => EnvFilter::new("made_in=debug,info"),
            2 => EnvFilter::new("made_in=trace,debug"),
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

fn open_storage(config: &Config) -> anyhow::Result<Arc<JsonStorage>> {
    let storage = JsonStorage::new(Path::new(&config.output.data_dir))
        .with_context(|| format!("Cannot open data directory {}", config.output.data_dir))?;
    Ok(Arc::new(storage))
}

/// Cancels the crawl on Ctrl-C; in-flight requests still finish
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after in-flight requests");
            cancel.cancel();
        }
    });
}

/// Handles the developers command: location search
async fn handle_developers(
    config: Config,
    locations: Vec<String>,
    page: u32,
    resume: bool,
) -> anyhow::Result<()> {
    let storage = open_storage(&config)?;
    let checkpoint = if resume {
        Some(load_checkpoint(storage.as_ref(), Endpoint::Users)?)
    } else {
        None
    };

    let locations = if locations.is_empty() {
        config.crawler.locations.clone()
    } else {
        locations
    };
    if checkpoint.is_none() && locations.is_empty() {
        bail!("No locations given; pass --location or set crawler.locations");
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());
    let coordinator = connect(config, storage, &cancel).await?;

    let outcome = match checkpoint {
        Some(checkpoint) => coordinator.resume(checkpoint).await,
        None => coordinator.crawl_developers(&locations, page).await,
    };

    match outcome {
        Ok(outcome) => {
            report_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Developer crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the repositories command: per-developer repository search
async fn handle_repositories(
    config: Config,
    developers: Vec<String>,
    rankers: bool,
    page: u32,
    resume: bool,
) -> anyhow::Result<()> {
    let storage = open_storage(&config)?;
    let checkpoint = if resume {
        Some(load_checkpoint(storage.as_ref(), Endpoint::Repositories)?)
    } else {
        None
    };

    let developers = if !developers.is_empty() {
        developers
    } else if rankers {
        storage.read_rankers()?
    } else {
        storage.read_developers()?
    };
    if checkpoint.is_none() && developers.is_empty() {
        bail!("No developers to search; run the developers command first");
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());
    let coordinator = connect(config, storage, &cancel).await?;

    let outcome = match checkpoint {
        Some(checkpoint) => coordinator.resume(checkpoint).await,
        None => coordinator.crawl_repositories(&developers, page).await,
    };

    match outcome {
        Ok(outcome) => {
            report_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Repository crawl failed: {}", e);
            Err(e.into())
        }
    }
}

fn load_checkpoint(
    storage: &dyn Storage,
    endpoint: Endpoint,
) -> anyhow::Result<made_in::storage::Checkpoint> {
    match storage.read_checkpoint(endpoint)? {
        Some(checkpoint) => Ok(checkpoint),
        None => bail!("No interrupted {} crawl to resume", endpoint),
    }
}

fn report_outcome(outcome: &CrawlOutcome) {
    println!(
        "{} crawl: {} subjects completed, {} saved",
        outcome.endpoint,
        outcome.completed.len(),
        outcome.saved
    );

    if let Some(cursor) = outcome.resume_point() {
        println!(
            "Stopped at '{}' page {} ({} subjects remaining)",
            cursor.subject,
            cursor.page,
            outcome.incomplete().len()
        );
        println!("Run the same command with --resume to continue");
    }
}

/// Handles the docs command: renders every document
fn handle_docs(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let today = chrono::Local::now().date_naive();

    let summary = generate_documents(&config.output, storage.as_ref(), today)?;

    println!("✓ Summary written to: {}", config.output.readme_path);
    println!(
        "✓ {} language documents in: {}",
        summary.languages, config.output.docs_dir
    );
    println!(
        "✓ {} ranked developers out of {} ({} repositories)",
        summary.ranked, summary.developers, summary.repositories
    );

    Ok(())
}

/// Handles the stats command
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Data directory: {}\n", config.output.data_dir);

    let storage = open_storage(config)?;
    let stats = load_statistics(storage.as_ref(), config.output.rank_style)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the check command: validates config and shows what would be crawled
fn handle_check(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    println!("=== Made-In Configuration Check ===\n");

    println!("API:");
    println!("  URL: {}", config.github.api_url);
    println!("  User agent: {}", config.github.user_agent);
    println!("  Tokens: {}", config.github.tokens.len());

    println!("\nCrawler:");
    println!("  Max page: {}", config.crawler.max_page);
    println!("  Min batch: {}", config.crawler.min_batch);
    println!("  Lowest star: {}", config.crawler.lowest_star);
    match config.crawler.repository_concurrency {
        Some(limit) => println!("  Repository concurrency: {}", limit),
        None => println!(
            "  Repository concurrency: {} (token count)",
            config.github.tokens.len()
        ),
    }

    println!("\nToken Pool:");
    println!("  Cooldown: {}ms", config.pool.cooldown_ms);
    println!("  Usage ceiling: {}", config.pool.usage_ceiling);

    println!("\nOutput:");
    println!("  Data: {}", config.output.data_dir);
    println!("  Docs: {}", config.output.docs_dir);
    println!("  Summary: {}", config.output.readme_path);
    println!("  Rank style: {:?}", config.output.rank_style);

    println!("\nLocations ({}):", config.crawler.locations.len());
    for location in &config.crawler.locations {
        println!("  - {}", location);
    }

    println!("\n✓ Configuration is valid (hash: {})", config_hash);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_conflicts_with_resume() {
        let err = Cli::try_parse_from(["made-in", "made-in.toml", "developers", "--resume", "--page", "3"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        let err = Cli::try_parse_from(["made-in", "made-in.toml", "repositories", "--resume", "--page", "3"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_resume_alone_parses() {
        let cli = Cli::try_parse_from(["made-in", "made-in.toml", "developers", "--resume"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Developers {
                resume: true,
                page: 1,
                ..
            }
        ));
    }
}

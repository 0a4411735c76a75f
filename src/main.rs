//! Tidepool main entry point
//!
//! Tidepool's orchestration engine is consumed as a library: crawls are
//! launched by embedding [`tidepool::crawler::run_crawl`] with
//! site-specific `TaskFetcher`/`Extractor` implementations. This binary
//! covers the operational side: validating configurations and inspecting
//! the resume state a configuration points at.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use tidepool::config::load_config_with_hash;
use tidepool::store::{open_store, Store};
use tracing_subscriber::EnvFilter;

/// Tidepool: a resumable, polite crawl orchestrator
#[derive(Parser, Debug)]
#[command(name = "tidepool")]
#[command(version = "1.0.0")]
#[command(about = "A resumable, polite crawl orchestrator", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["dry_run", "stats"])))]
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

    /// Validate config and show what a run would use without crawling
    #[arg(long)]
    dry_run: bool,

    /// Show resume-state statistics from the configured sinks and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
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

    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
    } else if cli.stats {
        handle_stats(&config)?;
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
            0 => EnvFilter::new("tidepool=info,warn"),
            1 => EnvFilter::new("tidepool=debug,info"),
            2 => EnvFilter::new("tidepool=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what a run would use
fn handle_dry_run(config: &tidepool::config::Config, config_hash: &str) {
    println!("=== Tidepool Dry Run ===\n");

    println!("Crawl Configuration:");
    println!("  Max attempts: {}", config.crawl.max_attempts);
    println!(
        "  Backoff: base {}ms, cap {}ms",
        config.crawl.backoff_base_ms, config.crawl.backoff_cap_ms
    );
    println!(
        "  Pacing: {}ms - {}ms between tasks",
        config.crawl.pace_min_ms, config.crawl.pace_max_ms
    );
    match config.crawl.item_cap {
        Some(cap) => println!("  Item cap: {}", cap),
        None => println!("  Item cap: unlimited"),
    }
    println!("  Shutdown grace: {}ms", config.crawl.shutdown_grace_ms);

    println!("\nSession:");
    println!("  User agent: {}", config.session.user_agent);
    if let Some(lang) = &config.session.accept_language {
        println!("  Accept-Language: {}", lang);
    }

    println!("\nOutput:");
    match config.output.format {
        tidepool::config::SinkFormat::Csv => {
            println!(
                "  Format: csv ({})",
                config.output.results_path.as_deref().unwrap_or("?")
            );
        }
        tidepool::config::SinkFormat::Json => {
            println!(
                "  Format: json ({})",
                config.output.output_dir.as_deref().unwrap_or("?")
            );
        }
    }
    println!("  Ledger: {}", config.output.ledger_path);

    println!("\nFields ({}):", config.fields.names.len());
    for name in &config.fields.names {
        let mut notes = Vec::new();
        if config.fields.key_fields.contains(name) {
            notes.push("key");
        }
        if config.fields.required.contains(name) {
            notes.push("required");
        }
        if notes.is_empty() {
            println!("  - {}", name);
        } else {
            println!("  - {} ({})", name, notes.join(", "));
        }
    }

    if let Some(tasks) = &config.tasks {
        println!("\nTask Source:");
        println!("  File: {}", tasks.path);
        println!("  Identifier column: {}", tasks.id_column);
        println!("  Label column: {}", tasks.label_column);
        println!("  Key columns: {}", tasks.key_columns.join(", "));
    }

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}

/// Handles the --stats mode: shows resume state from the configured sinks
fn handle_stats(config: &tidepool::config::Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Tidepool Resume State ===\n");

    let mut store = open_store(&config.output, &config.fields)?;
    let loaded = store.load()?;

    println!("Persisted records: {}", loaded.existing.len());
    println!("Attempted identifiers: {}", loaded.attempted.len());

    let pending = loaded
        .attempted
        .len()
        .saturating_sub(loaded.existing.len());
    if pending > 0 {
        println!(
            "Attempted but never persisted: {} (will be skipped on resume)",
            pending
        );
    }

    Ok(())
}

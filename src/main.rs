//! Final-Hop main entry point
//!
//! This is the command-line interface for the Final-Hop bulk redirect resolver.

use clap::Parser;
use final_hop::config::{load_config_with_hash, validate, Config};
use final_hop::output::print_summary;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Final-Hop: a polite bulk redirect resolver
///
/// Reads a single-column CSV of URLs, resolves the final URL of each one after
/// redirects, and appends `link,redirected_link,error` rows to the output CSV.
/// Requests to the same host are made one at a time with a politeness delay.
#[derive(Parser, Debug)]
#[command(name = "final-hop")]
#[command(version = "1.0.0")]
#[command(about = "A polite bulk redirect resolver", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input CSV with one URL per row
    #[arg(short, long, visible_alias = "file", short_alias = 'f', value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output CSV, appended to if it exists
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Discard the first input row as a header
    #[arg(long)]
    has_header: bool,

    /// URLs read before each worker pool run
    #[arg(long)]
    batch_size: Option<usize>,

    /// Upper bound on concurrent workers
    #[arg(long)]
    max_workers: Option<usize>,

    /// Pause between requests to the same domain, in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the configuration and print it without fetching anything
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Layers command-line flags over the file (or default) configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if self.has_header {
            config.input.has_header = true;
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.pool.batch_size = batch_size;
        }
        if let Some(max_workers) = self.max_workers {
            config.pool.max_workers = max_workers;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.pool.politeness_delay_ms = delay_ms;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.fetcher.timeout_secs = timeout_secs;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_run(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("final_hop=info,warn"),
            1 => EnvFilter::new("final_hop=debug,info"),
            2 => EnvFilter::new("final_hop=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Final-Hop Dry Run ===\n");

    println!("Input:");
    println!("  Path: {}", config.input.path.display());
    println!("  Header row: {}", config.input.has_header);

    println!("\nOutput:");
    println!("  Path: {}", config.output.path.display());

    println!("\nFetcher:");
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Max redirects: {}", config.fetcher.max_redirects);
    println!("  User agents: {}", config.fetcher.user_agents.len());

    println!("\nPool:");
    println!("  Batch size: {}", config.pool.batch_size);
    println!("  Max workers: {}", config.pool.max_workers);
    println!("  Politeness delay: {}ms", config.pool.politeness_delay_ms);

    println!("\n✓ Configuration is valid");
}

/// Handles the main run, wiring Ctrl-C to cancellation
async fn handle_run(config: Config, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing the current batch");
            on_signal.cancel();
        }
    });

    match final_hop::engine::run(&config, cancel).await {
        Ok(summary) => {
            if !quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

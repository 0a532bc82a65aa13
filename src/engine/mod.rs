//! Fetch orchestration engine
//!
//! This module contains the concurrent core:
//! - Resolving one URL over HTTP with a rotating user agent
//! - Partitioning each batch by domain
//! - A per-batch worker pool, one worker per domain up to a cap
//! - The batch streamer that keeps memory bounded by the batch size

mod fetcher;
mod partition;
mod pool;
mod streamer;

pub use fetcher::{build_http_client, PageFetcher, ReqwestFetcher};
pub use partition::{partition_by_domain, Job, Partition};
pub use pool::{FetchOutcome, PoolHandle, WorkerPool};
pub use streamer::{BatchReport, BatchStreamer, RunSummary};

use crate::config::Config;
use crate::input::CsvUrlSource;
use crate::output::CsvResultWriter;
use crate::FinalHopError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs a complete resolve job as described by `config`
///
/// This is the main entry point. It will:
/// 1. Build the HTTP client
/// 2. Open the input (failing on a missing or empty file)
/// 3. Open the result file in append mode
/// 4. Stream the input through the engine batch by batch
///
/// Nothing is written to the output before the input has been opened and
/// found non-empty.
///
/// # Example
///
/// ```no_run
/// use final_hop::config::load_config;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("final-hop.toml"))?;
/// let summary = final_hop::engine::run(&config, CancellationToken::new()).await?;
/// println!("{} URLs processed", summary.urls_read);
/// # Ok(())
/// # }
/// ```
pub async fn run(config: &Config, cancel: CancellationToken) -> Result<RunSummary, FinalHopError> {
    let fetcher = Arc::new(ReqwestFetcher::new(&config.fetcher)?);

    let source = CsvUrlSource::open(&config.input.path, config.input.has_header)?;
    tracing::info!("Reading URLs from {}", source.path().display());

    let mut sink = CsvResultWriter::open(&config.output.path)?;
    tracing::info!("Appending results to {}", config.output.path.display());

    let streamer = BatchStreamer::new(fetcher, config.pool.clone(), cancel);
    streamer.run(source, &mut sink).await
}

//! Batch streamer - bounded-memory driver of the whole pipeline
//!
//! Reads URLs one at a time, and each time the buffer reaches the batch size
//! (or the input ends) runs partition → worker pool → sink on that batch
//! before reading further. Only one batch's URLs and results are alive at any
//! moment, whatever the size of the input.

use crate::config::PoolConfig;
use crate::engine::fetcher::PageFetcher;
use crate::engine::partition::{partition_by_domain, Partition};
use crate::engine::pool::WorkerPool;
use crate::output::{ResultSink, RunStatistics};
use crate::FinalHopError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_util::sync::CancellationToken;

/// What happened to one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Zero-based batch number
    pub index: usize,

    /// URLs in the batch
    pub url_count: usize,

    /// Distinct domains in the batch
    pub domain_count: usize,

    /// Workers the pool ran with (zero if nothing was fetchable)
    pub worker_count: usize,

    /// URLs rejected before fetching
    pub rejected_count: usize,

    pub elapsed: Duration,
}

/// Outcome of a complete streaming run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// URLs read from the source
    pub urls_read: usize,

    /// One report per batch, in processing order
    pub batches: Vec<BatchReport>,

    /// Largest number of URLs buffered at once
    pub peak_buffered: usize,

    /// Whether the run stopped early on cancellation
    pub cancelled: bool,

    pub stats: RunStatistics,
}

impl RunSummary {
    /// Largest worker count used by any batch
    pub fn peak_workers(&self) -> usize {
        self.batches
            .iter()
            .map(|b| b.worker_count)
            .max()
            .unwrap_or(0)
    }
}

/// Drives the batch loop for one run
pub struct BatchStreamer<F: ?Sized> {
    fetcher: Arc<F>,
    config: PoolConfig,
    cancel: CancellationToken,
}

impl<F> BatchStreamer<F>
where
    F: PageFetcher + ?Sized + 'static,
{
    pub fn new(fetcher: Arc<F>, config: PoolConfig, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            config,
            cancel,
        }
    }

    /// Streams every URL from `source` through the pipeline into `sink`
    ///
    /// Each batch is fully written before the next one is read. Fatal errors
    /// (a source read error, a sink write error, a failed worker task) only
    /// surface between batches, never with a batch partly written. URLs read
    /// before a source error are still written out before it is returned.
    ///
    /// On cancellation the source is no longer read; URLs already buffered
    /// are still reported (as cancelled) so every URL read gets a row.
    pub async fn run<I, S>(&self, source: I, sink: &mut S) -> Result<RunSummary, FinalHopError>
    where
        I: IntoIterator<Item = Result<String, FinalHopError>>,
        S: ResultSink + ?Sized,
    {
        let started_at = Utc::now();
        let batch_size = self.config.batch_size.max(1);

        let mut records = source.into_iter();
        let mut batches = Vec::new();
        let mut stats = RunStatistics::default();
        let mut urls_read = 0;
        let mut peak_buffered = 0;

        loop {
            if self.cancel.is_cancelled() {
                tracing::warn!("Cancellation requested, no further input will be read");
                break;
            }

            let fill = offload_blocking(|| fill_batch(&mut records, batch_size, &self.cancel));
            urls_read += fill.urls.len();
            peak_buffered = peak_buffered.max(fill.urls.len());

            if !fill.urls.is_empty() {
                let report = self.process_batch(batches.len(), fill.urls, sink, &mut stats).await?;
                batches.push(report);
            }

            match fill.end {
                Some(FillEnd::Exhausted) => break,
                Some(FillEnd::Failed(e)) => return Err(e),
                None => {}
            }
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            urls_read,
            batches,
            peak_buffered,
            cancelled: self.cancel.is_cancelled(),
            stats,
        };

        tracing::info!(
            "Finished processing: {} URLs in {} batches ({} resolved, {} failed)",
            summary.urls_read,
            summary.batches.len(),
            summary.stats.resolved,
            summary.stats.failed
        );

        Ok(summary)
    }

    /// Partitions, fetches and writes out one batch
    async fn process_batch<S>(
        &self,
        index: usize,
        urls: Vec<String>,
        sink: &mut S,
        stats: &mut RunStatistics,
    ) -> Result<BatchReport, FinalHopError>
    where
        S: ResultSink + ?Sized,
    {
        let start = Instant::now();
        let url_count = urls.len();

        let Partition { jobs, rejected } = partition_by_domain(urls);
        let domain_count = jobs.len();
        let rejected_count = rejected.len();
        let worker_count = WorkerPool::<F>::size_for(domain_count, self.config.max_workers);

        tracing::info!(
            "Starting batch {}: {} URLs across {} domains, {} workers",
            index + 1,
            url_count,
            domain_count,
            worker_count
        );

        let mut outcomes = rejected;
        if !jobs.is_empty() {
            let pool = WorkerPool::new(
                Arc::clone(&self.fetcher),
                worker_count,
                self.config.politeness_delay(),
                self.cancel.clone(),
            );
            outcomes.extend(pool.run(jobs).await?);
        }

        debug_assert_eq!(outcomes.len(), url_count);

        offload_blocking(|| sink.write_batch(&outcomes))?;
        stats.record_all(&outcomes);

        let elapsed = start.elapsed();
        tracing::info!(
            "Batch {} complete: {} results written in {:.2?}",
            index + 1,
            outcomes.len(),
            elapsed
        );

        Ok(BatchReport {
            index,
            url_count,
            domain_count,
            worker_count,
            rejected_count,
            elapsed,
        })
    }
}

/// Why a fill stopped short of a full batch
enum FillEnd {
    Exhausted,
    Failed(FinalHopError),
}

struct Fill {
    urls: Vec<String>,
    end: Option<FillEnd>,
}

/// Pulls up to `batch_size` URLs, checking for cancellation before each pull
fn fill_batch<R>(records: &mut R, batch_size: usize, cancel: &CancellationToken) -> Fill
where
    R: Iterator<Item = Result<String, FinalHopError>>,
{
    let mut urls = Vec::new();

    while urls.len() < batch_size && !cancel.is_cancelled() {
        match records.next() {
            Some(Ok(url)) => urls.push(url),
            Some(Err(e)) => {
                return Fill {
                    urls,
                    end: Some(FillEnd::Failed(e)),
                }
            }
            None => {
                return Fill {
                    urls,
                    end: Some(FillEnd::Exhausted),
                }
            }
        }
    }

    Fill { urls, end: None }
}

/// Runs blocking file I/O without stalling other tasks on a multi-thread
/// runtime. On a current-thread runtime it simply runs inline.
fn offload_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

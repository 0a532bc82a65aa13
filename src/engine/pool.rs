//! Worker pool for one batch
//!
//! The pool pairs a bounded job queue with a bounded result queue:
//! - A producer task enqueues one job per domain, then closes the job queue
//! - Each worker pulls jobs until the queue is drained and closed
//! - Within a job, URLs are fetched strictly in order with a politeness delay
//! - A supervisor joins every worker and only then closes the result queue
//!
//! A pool is built for exactly one batch and consumed by [`WorkerPool::spawn`]
//! or [`WorkerPool::run`]; nothing is shared between batches.

use crate::engine::fetcher::PageFetcher;
use crate::engine::partition::Job;
use crate::{RecordError, FinalHopError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Outcome of processing one input URL
///
/// Produced exactly once per URL, by the worker that handled it (or by the
/// partitioner, for URLs that never reached a worker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Domain key of the URL; empty when none could be determined
    pub domain: String,

    /// The URL as read from the input
    pub url: String,

    /// URL reached after following redirects; empty on error
    pub final_url: String,

    /// Record-level failure, if any
    pub error: Option<RecordError>,
}

impl FetchOutcome {
    pub fn resolved(domain: String, url: String, final_url: String) -> Self {
        Self {
            domain,
            url,
            final_url,
            error: None,
        }
    }

    pub fn failed(domain: String, url: String, error: RecordError) -> Self {
        Self {
            domain,
            url,
            final_url: String::new(),
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Whether the final URL differs from the one requested
    pub fn was_redirected(&self) -> bool {
        self.is_success() && self.final_url != self.url
    }

    /// Error column value: the error message, or empty on success
    pub fn error_text(&self) -> String {
        self.error.as_ref().map(ToString::to_string).unwrap_or_default()
    }
}

/// Running pool: a stream of results plus the supervisor that closes it
pub struct PoolHandle {
    /// Results in arrival order; closed once every worker has finished
    pub results: mpsc::Receiver<FetchOutcome>,

    supervisor: JoinHandle<Result<(), FinalHopError>>,
}

impl PoolHandle {
    /// Waits for the supervisor, surfacing any worker failure
    ///
    /// Call after `results` has been drained.
    pub async fn join(self) -> Result<(), FinalHopError> {
        self.supervisor.await?
    }
}

/// Bounded worker pool scoped to a single batch
pub struct WorkerPool<F: ?Sized> {
    fetcher: Arc<F>,
    worker_count: usize,
    politeness_delay: Duration,
    cancel: CancellationToken,
}

impl<F> WorkerPool<F>
where
    F: PageFetcher + ?Sized + 'static,
{
    /// Creates a pool with `worker_count` workers and queues of the same capacity
    ///
    /// A count of zero is raised to one.
    pub fn new(
        fetcher: Arc<F>,
        worker_count: usize,
        politeness_delay: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            worker_count: worker_count.max(1),
            politeness_delay,
            cancel,
        }
    }

    /// Worker count for a batch: one per domain, capped at `max_workers`
    pub fn size_for(domain_count: usize, max_workers: usize) -> usize {
        domain_count.min(max_workers)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Starts the producer, the workers and the supervisor
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(self, jobs: Vec<Job>) -> PoolHandle {
        let (job_tx, job_rx) = mpsc::channel::<Job>(self.worker_count);
        let (result_tx, result_rx) = mpsc::channel::<FetchOutcome>(self.worker_count);
        let job_rx = Arc::new(Mutex::new(job_rx));

        // Producer: the only owner of the job sender, so the queue closes
        // when it finishes
        tokio::spawn(async move {
            for job in jobs {
                if job_tx.send(job).await.is_err() {
                    tracing::warn!("Job queue closed before all jobs were enqueued");
                    break;
                }
            }
        });

        let workers: Vec<JoinHandle<()>> = (0..self.worker_count)
            .map(|worker_id| {
                tokio::spawn(worker(
                    worker_id,
                    Arc::clone(&self.fetcher),
                    Arc::clone(&job_rx),
                    result_tx.clone(),
                    self.politeness_delay,
                    self.cancel.clone(),
                ))
            })
            .collect();

        // Supervisor: holds the last result sender until every worker is joined
        let supervisor = tokio::spawn(async move {
            let mut failure = None;
            for handle in workers {
                if let Err(e) = handle.await {
                    tracing::error!("Worker task failed: {}", e);
                    failure.get_or_insert(e);
                }
            }
            drop(result_tx);
            tracing::trace!("All workers joined, result queue closed");

            match failure {
                Some(e) => Err(FinalHopError::Worker(e)),
                None => Ok(()),
            }
        });

        PoolHandle {
            results: result_rx,
            supervisor,
        }
    }

    /// Runs every job to completion and collects the results
    ///
    /// Results are returned in arrival order; there is no ordering across
    /// domains. Within a domain, results follow input order.
    pub async fn run(self, jobs: Vec<Job>) -> Result<Vec<FetchOutcome>, FinalHopError> {
        let expected: usize = jobs.iter().map(|job| job.urls.len()).sum();
        let mut handle = self.spawn(jobs);

        let mut outcomes = Vec::with_capacity(expected);
        while let Some(outcome) = handle.results.recv().await {
            outcomes.push(outcome);
        }

        handle.join().await?;
        Ok(outcomes)
    }
}

/// Pulls jobs from the shared queue until it is drained and closed
async fn worker<F>(
    worker_id: usize,
    fetcher: Arc<F>,
    jobs: Arc<Mutex<mpsc::Receiver<Job>>>,
    results: mpsc::Sender<FetchOutcome>,
    politeness_delay: Duration,
    cancel: CancellationToken,
) where
    F: PageFetcher + ?Sized,
{
    tracing::trace!("Worker {} started", worker_id);

    loop {
        // The lock is released as soon as a job (or the closed signal) arrives
        let next = jobs.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        tracing::trace!(
            "Worker {} took {} ({} URLs)",
            worker_id,
            job.domain,
            job.urls.len()
        );

        if !process_job(&*fetcher, job, &results, politeness_delay, &cancel).await {
            tracing::warn!("Worker {}: result queue closed, stopping", worker_id);
            break;
        }
    }

    tracing::trace!("Worker {} finished", worker_id);
}

/// Fetches one job's URLs in order, emitting one result per URL
///
/// Returns `false` if the result queue has been closed by the consumer.
async fn process_job<F>(
    fetcher: &F,
    job: Job,
    results: &mpsc::Sender<FetchOutcome>,
    politeness_delay: Duration,
    cancel: &CancellationToken,
) -> bool
where
    F: PageFetcher + ?Sized,
{
    let Job { domain, urls } = job;
    let last = urls.len().saturating_sub(1);

    for (index, url) in urls.into_iter().enumerate() {
        let outcome = if cancel.is_cancelled() {
            FetchOutcome::failed(domain.clone(), url, RecordError::Cancelled)
        } else {
            match fetcher.resolve(&url).await {
                Ok(final_url) => FetchOutcome::resolved(domain.clone(), url, final_url),
                Err(e) => FetchOutcome::failed(domain.clone(), url, e),
            }
        };

        match &outcome.error {
            None => tracing::debug!("{} -> {}", outcome.url, outcome.final_url),
            Some(e) => tracing::debug!("{} failed: {}", outcome.url, e),
        }

        if results.send(outcome).await.is_err() {
            return false;
        }

        // Delay only between requests to this domain, never after the last one
        if index < last && !politeness_delay.is_zero() && !cancel.is_cancelled() {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(politeness_delay) => {}
            }
        }
    }

    true
}

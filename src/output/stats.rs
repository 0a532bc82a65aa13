//! Run statistics
//!
//! Accumulates per-outcome counters while batches are written, and prints the
//! end-of-run report.

use crate::engine::{FetchOutcome, RunSummary};
use std::collections::HashMap;

/// Counters over every result written in a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Results written
    pub total: u64,

    /// URLs that resolved without error
    pub resolved: u64,

    /// Resolved URLs whose final URL differs from the input
    pub redirected: u64,

    /// URLs that failed
    pub failed: u64,

    /// Failure counts keyed by error kind
    pub errors_by_kind: HashMap<&'static str, u64>,
}

impl RunStatistics {
    /// Records one outcome
    pub fn record(&mut self, outcome: &FetchOutcome) {
        self.total += 1;
        match &outcome.error {
            None => {
                self.resolved += 1;
                if outcome.was_redirected() {
                    self.redirected += 1;
                }
            }
            Some(e) => {
                self.failed += 1;
                *self.errors_by_kind.entry(e.kind()).or_insert(0) += 1;
            }
        }
    }

    pub fn record_all(&mut self, outcomes: &[FetchOutcome]) {
        for outcome in outcomes {
            self.record(outcome);
        }
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.resolved as f64 / self.total as f64) * 100.0
    }
}

/// Prints the end-of-run report to stdout
pub fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    let elapsed = (summary.finished_at - summary.started_at)
        .to_std()
        .unwrap_or_default();

    println!("=== Run Summary ===\n");

    println!("Overview:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  URLs read: {}", summary.urls_read);
    println!("  Batches: {}", summary.batches.len());
    println!("  Peak workers: {}", summary.peak_workers());
    if summary.cancelled {
        println!("  Cancelled before the input was exhausted");
    }
    println!();

    println!("Results:");
    println!("  Resolved: {}", stats.resolved);
    println!("  Redirected: {}", stats.redirected);
    println!("  Failed: {}", stats.failed);
    println!();

    if !stats.errors_by_kind.is_empty() {
        println!("Error Summary:");
        let mut error_counts: Vec<_> = stats.errors_by_kind.iter().collect();
        error_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (kind, count) in error_counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Visited {} links in {:.2} seconds ({:.1}% resolved)",
        stats.total,
        elapsed.as_secs_f64(),
        stats.success_rate()
    );
}

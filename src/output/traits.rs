//! Output sink trait and errors
//!
//! The engine hands each finished batch to a [`ResultSink`] before reading
//! any more input.

use crate::engine::FetchOutcome;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to open output {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode results for {path}: {source}")]
    Encode { path: PathBuf, source: csv::Error },

    #[error("Failed to write results to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to flush results to {path}: {source}")]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for result rows
///
/// Implementations append rows in the order given and must have flushed them
/// by the time `write_batch` returns. Any error is fatal to the run.
pub trait ResultSink {
    /// Appends one batch of results
    fn write_batch(&mut self, outcomes: &[FetchOutcome]) -> OutputResult<()>;
}

/// Collects results in memory; handy for embedding and tests
impl ResultSink for Vec<FetchOutcome> {
    fn write_batch(&mut self, outcomes: &[FetchOutcome]) -> OutputResult<()> {
        self.extend_from_slice(outcomes);
        Ok(())
    }
}

//! Output module for result rows and run reports
//!
//! This module handles:
//! - The sink interface batches are written through
//! - Appending result rows to a CSV file
//! - Recording and printing run statistics

mod csv_output;
pub mod stats;
mod traits;

pub use csv_output::{CsvResultWriter, RESULT_HEADER};
pub use stats::{print_summary, RunStatistics};
pub use traits::{OutputError, OutputResult, ResultSink};

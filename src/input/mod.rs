//! Input module for reading URL records
//!
//! The engine consumes any iterator of `Result<String, FinalHopError>`; the CSV
//! source here is the one the binary uses.

mod csv_source;

pub use csv_source::CsvUrlSource;

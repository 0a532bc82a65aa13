use crate::engine::FetchOutcome;
use crate::output::traits::{OutputError, OutputResult, ResultSink};
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Column names of the result file
pub const RESULT_HEADER: [&str; 3] = ["link", "redirected_link", "error"];

/// Appends result rows to a CSV file
///
/// The header is written only when the target starts out empty, so runs that
/// append to an existing result file never repeat it.
///
/// Each batch is encoded in memory first and handed to the target in a single
/// `write_all`, so an encoding failure never leaves part of a batch behind.
pub struct CsvResultWriter<W: Write = File> {
    path: PathBuf,
    inner: W,
    rows_written: u64,
}

impl CsvResultWriter<File> {
    /// Opens (or creates) the result file in append mode
    pub fn open(path: &Path) -> OutputResult<Self> {
        let open_error = |source| OutputError::Open {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_error)?;
        let is_empty = file.metadata().map_err(open_error)?.len() == 0;

        Self::from_writer(path, file, is_empty)
    }
}

impl<W: Write> CsvResultWriter<W> {
    /// Wraps an arbitrary writer; `path` is only used in error messages
    pub fn from_writer(path: impl Into<PathBuf>, inner: W, write_header: bool) -> OutputResult<Self> {
        let mut sink = Self {
            path: path.into(),
            inner,
            rows_written: 0,
        };

        if write_header {
            let header = sink.encode(std::iter::once(RESULT_HEADER.map(str::to_string)))?;
            sink.append(&header)?;
        }

        Ok(sink)
    }

    /// Number of result rows written so far, header excluded
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Returns the underlying writer; everything written has been flushed
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn encode<I>(&self, rows: I) -> OutputResult<Vec<u8>>
    where
        I: IntoIterator<Item = [String; 3]>,
    {
        let encode_error = |source| OutputError::Encode {
            path: self.path.clone(),
            source,
        };

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
        for row in rows {
            writer.write_record(&row).map_err(encode_error)?;
        }

        writer
            .into_inner()
            .map_err(|e| encode_error(csv::Error::from(e.into_error())))
    }

    fn append(&mut self, bytes: &[u8]) -> OutputResult<()> {
        self.inner
            .write_all(bytes)
            .map_err(|source| OutputError::Write {
                path: self.path.clone(),
                source,
            })?;

        self.inner.flush().map_err(|source| OutputError::Flush {
            path: self.path.clone(),
            source,
        })
    }
}

impl<W: Write> ResultSink for CsvResultWriter<W> {
    fn write_batch(&mut self, outcomes: &[FetchOutcome]) -> OutputResult<()> {
        let bytes = self.encode(
            outcomes
                .iter()
                .map(|o| [o.url.clone(), o.final_url.clone(), o.error_text()]),
        )?;
        self.append(&bytes)?;
        self.rows_written += outcomes.len() as u64;
        Ok(())
    }
}

use crate::FinalHopError;
use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Incremental reader over a single-column CSV of URLs
///
/// Rows are pulled from disk one at a time as the iterator advances, so the
/// file is never loaded whole. Only the first column is used; surrounding
/// whitespace is trimmed and blank cells are skipped.
///
/// Cells that are not valid UTF-8 are decoded lossily and passed on, so they
/// end up as `invalid URL` rows rather than stopping the run. Only I/O errors
/// are fatal: the iterator yields such an error once and then ends.
pub struct CsvUrlSource {
    path: PathBuf,
    records: ByteRecordsIntoIter<File>,
    pending: Option<ByteRecord>,
    failed: bool,
}

impl CsvUrlSource {
    /// Opens the input file and reads its first row
    ///
    /// # Errors
    ///
    /// * `FinalHopError::InputOpen` - The file could not be opened
    /// * `FinalHopError::EmptyInput` - The file holds no rows at all
    /// * `FinalHopError::InputRead` - The first row could not be read
    pub fn open(path: &Path, has_header: bool) -> Result<Self, FinalHopError> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|source| FinalHopError::InputOpen {
                path: path.to_path_buf(),
                source,
            })?;

        let mut records = reader.into_byte_records();

        let first = match records.next() {
            Some(Ok(record)) => record,
            Some(Err(source)) => {
                return Err(FinalHopError::InputRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
            None => {
                return Err(FinalHopError::EmptyInput {
                    path: path.to_path_buf(),
                })
            }
        };

        let pending = if has_header {
            tracing::debug!(
                "Discarding header row: {:?}",
                first.get(0).map(String::from_utf8_lossy)
            );
            None
        } else {
            Some(first)
        };

        Ok(Self {
            path: path.to_path_buf(),
            records,
            pending,
            failed: false,
        })
    }

    /// Path of the file being read
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn url_from_record(record: &ByteRecord, path: &Path) -> Option<String> {
    let cell = record.get(0)?;
    let text = match std::str::from_utf8(cell) {
        Ok(text) => text.trim().to_string(),
        Err(_) => {
            tracing::warn!(
                "Row {} of {} is not valid UTF-8",
                record.position().map_or(0, |p| p.line()),
                path.display()
            );
            String::from_utf8_lossy(cell).trim().to_string()
        }
    };

    (!text.is_empty()).then_some(text)
}

impl Iterator for CsvUrlSource {
    type Item = Result<String, FinalHopError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Some(first) = self.pending.take() {
            if let Some(url) = url_from_record(&first, &self.path) {
                return Some(Ok(url));
            }
        }

        loop {
            match self.records.next()? {
                Ok(record) => {
                    if let Some(url) = url_from_record(&record, &self.path) {
                        return Some(Ok(url));
                    }
                    tracing::trace!("Skipping blank row in {}", self.path.display());
                }
                Err(source) => {
                    self.failed = true;
                    return Some(Err(FinalHopError::InputRead {
                        path: self.path.clone(),
                        source,
                    }));
                }
            }
        }
    }
}

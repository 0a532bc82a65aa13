use async_trait::async_trait;
use final_hop::config::PoolConfig;
use final_hop::{PageFetcher, RecordError};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::time::Instant;

/// Fake fetcher: records call times, sleeps for `latency`, then answers from
/// `redirects` (or echoes the URL back when it has no entry)
pub struct FakeFetcher {
    latency: Duration,
    redirects: HashMap<String, String>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl FakeFetcher {
    pub fn new(latency: Duration) -> Arc<Self> {
        Self::with_redirects(latency, &[])
    }

    pub fn with_redirects(latency: Duration, redirects: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            latency,
            redirects: redirects
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls grouped by host, each group in call order
    pub fn calls_by_host(&self) -> HashMap<String, Vec<(String, Instant)>> {
        let mut grouped: HashMap<String, Vec<(String, Instant)>> = HashMap::new();
        for (url, at) in self.calls() {
            let host = final_hop::extract_domain(&url).unwrap();
            grouped.entry(host).or_default().push((url, at));
        }
        grouped
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn resolve(&self, url: &str) -> Result<String, RecordError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        Ok(self
            .redirects
            .get(url)
            .cloned()
            .unwrap_or_else(|| url.to_string()))
    }
}

pub fn pool_config(batch_size: usize, max_workers: usize, delay_ms: u64) -> PoolConfig {
    PoolConfig {
        batch_size,
        max_workers,
        politeness_delay_ms: delay_ms,
    }
}

/// Writes one URL per line to a temporary CSV file
pub fn write_input(lines: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Reads a result CSV back as (link, redirected_link, error) rows, header included
pub fn read_rows(path: &std::path::Path) -> Vec<(String, String, String)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();

    reader
        .records()
        .map(|record| {
            let record = record.unwrap();
            (
                record[0].to_string(),
                record[1].to_string(),
                record[2].to_string(),
            )
        })
        .collect()
}

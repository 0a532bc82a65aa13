//! Domain partitioning of a batch
//!
//! Groups the URLs of one batch by domain key. Each group becomes a [`Job`],
//! the unit of work a single worker drains sequentially.

use crate::engine::pool::FetchOutcome;
use crate::url::extract_domain;
use std::collections::HashMap;

/// One domain's ordered URL list, consumed exactly once by one worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Domain key shared by every URL in the job
    pub domain: String,

    /// URLs in the order they appeared in the batch
    pub urls: Vec<String>,
}

/// Result of partitioning a batch
#[derive(Debug, Default)]
pub struct Partition {
    /// One job per distinct domain, in first-seen order
    pub jobs: Vec<Job>,

    /// Failed results for URLs with no usable domain
    pub rejected: Vec<FetchOutcome>,
}

impl Partition {
    /// Number of distinct domains in the batch
    pub fn domain_count(&self) -> usize {
        self.jobs.len()
    }

    /// Number of URLs that will be fetched
    pub fn fetchable_count(&self) -> usize {
        self.jobs.iter().map(|job| job.urls.len()).sum()
    }
}

/// Partitions a batch of URLs by domain key
///
/// Relative order is preserved within each domain, and jobs are returned in
/// the order their domain was first seen. A URL whose domain cannot be
/// determined does not stop partitioning: it is returned as a failed result
/// in [`Partition::rejected`].
///
/// # Example
///
/// ```
/// use final_hop::engine::partition_by_domain;
///
/// let partition = partition_by_domain(vec![
///     "https://a.com/1".to_string(),
///     "https://b.com/1".to_string(),
///     "https://a.com/2".to_string(),
/// ]);
/// assert_eq!(partition.jobs.len(), 2);
/// assert_eq!(partition.jobs[0].urls, vec!["https://a.com/1", "https://a.com/2"]);
/// ```
pub fn partition_by_domain(urls: Vec<String>) -> Partition {
    let mut partition = Partition::default();
    let mut index_by_domain: HashMap<String, usize> = HashMap::new();

    for url in urls {
        let domain = match extract_domain(&url) {
            Ok(domain) => domain,
            Err(e) => {
                tracing::warn!("Rejecting malformed URL {:?}: {}", url, e);
                partition.rejected.push(FetchOutcome::failed(String::new(), url, e.into()));
                continue;
            }
        };

        match index_by_domain.get(&domain) {
            Some(&index) => partition.jobs[index].urls.push(url),
            None => {
                index_by_domain.insert(domain.clone(), partition.jobs.len());
                partition.jobs.push(Job {
                    domain,
                    urls: vec![url],
                });
            }
        }
    }

    partition
}

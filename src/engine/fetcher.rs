//! HTTP fetcher implementation
//!
//! This module handles the single point of external I/O in the engine:
//! - Building the HTTP client with timeout and redirect policy
//! - Rotating the user agent per request
//! - Resolving the final URL after redirects
//! - Error classification

use crate::config::FetcherConfig;
use crate::RecordError;
use async_trait::async_trait;
use reqwest::{header::USER_AGENT, redirect::Policy, Client};

/// Resolves one URL to its final, post-redirect form
///
/// Implementations must be cheap to share between workers. On error no URL is
/// returned; callers record the failure and move on.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<String, RecordError>;
}

/// Production fetcher backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    user_agents: Vec<String>,
}

impl ReqwestFetcher {
    /// Builds a fetcher from the fetcher configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use final_hop::config::FetcherConfig;
    /// use final_hop::engine::ReqwestFetcher;
    ///
    /// let fetcher = ReqwestFetcher::new(&FetcherConfig::default()).unwrap();
    /// ```
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            user_agents: config.user_agents.clone(),
        })
    }

    /// Picks a user agent uniformly at random from the pool
    fn pick_user_agent(&self) -> &str {
        match self.user_agents.len() {
            0 => "",
            n => &self.user_agents[rand::random_range(0..n)],
        }
    }
}

/// Builds an HTTP client with the configured timeout and redirect limit
///
/// The timeout covers the whole exchange, redirect hops included.
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout())
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    /// Issues a GET and returns the URL the redirect chain ended on
    ///
    /// Any HTTP status counts as a resolved URL; only transport-level failures
    /// are errors. The response body is never read.
    async fn resolve(&self, url: &str) -> Result<String, RecordError> {
        let user_agent = self.pick_user_agent();

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(classify_error)?;

        tracing::trace!("{} -> {} ({})", url, response.url(), response.status());

        Ok(response.url().to_string())
    }
}

/// Maps a `reqwest` failure onto a record-level error
fn classify_error(e: reqwest::Error) -> RecordError {
    if e.is_timeout() {
        RecordError::Timeout
    } else if e.is_redirect() {
        RecordError::RedirectLimit
    } else if e.is_connect() {
        RecordError::Connect(e.to_string())
    } else {
        RecordError::Request(e.to_string())
    }
}

//! Final-Hop: a polite bulk redirect resolver
//!
//! This crate reads an arbitrarily large list of URLs, resolves the final
//! (post-redirect) URL for each one and streams the results to a CSV file.
//! Requests to the same host are never issued concurrently, and memory use is
//! bounded by the configured batch size rather than by the size of the input.

pub mod config;
pub mod engine;
pub mod input;
pub mod output;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Fatal error type for Final-Hop operations
///
/// Anything surfacing as a `FinalHopError` aborts the run. Per-URL problems are
/// never fatal; they travel inside a [`engine::FetchOutcome`] as a [`RecordError`].
#[derive(Debug, Error)]
pub enum FinalHopError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open input {path}: {source}")]
    InputOpen { path: PathBuf, source: csv::Error },

    #[error("Failed to read input {path}: {source}")]
    InputRead { path: PathBuf, source: csv::Error },

    #[error("Input file {path} contains no records")]
    EmptyInput { path: PathBuf },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingDomain,

    #[error("URL is not valid UTF-8")]
    InvalidEncoding,
}

/// Per-record failure, reported as data in the output row
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("too many redirects")]
    RedirectLimit,

    #[error("request failed: {0}")]
    Request(String),

    #[error("cancelled")]
    Cancelled,
}

impl RecordError {
    /// Short, stable label used for grouping failures in run statistics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "invalid-url",
            Self::Timeout => "timeout",
            Self::Connect(_) => "connect",
            Self::RedirectLimit => "redirect-limit",
            Self::Request(_) => "request",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Result type alias for Final-Hop operations
pub type Result<T> = std::result::Result<T, FinalHopError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::{run, FetchOutcome, Job, PageFetcher, ReqwestFetcher};
pub use crate::url::extract_domain;

//! Configuration module for Final-Hop
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a configuration file is optional; command-line
//! flags are layered on top by the binary before validation.
//!
//! # Example
//!
//! ```no_run
//! use final_hop::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("final-hop.toml")).unwrap();
//! println!("Politeness delay: {}ms", config.pool.politeness_delay_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetcherConfig, InputConfig, OutputConfig, PoolConfig, DEFAULT_USER_AGENTS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;

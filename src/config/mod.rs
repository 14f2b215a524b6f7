//! Configuration module for Docsweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a file only needs to name what it changes.
//!
//! # Example
//!
//! ```no_run
//! use docsweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("docsweep.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlMode, CrawlerConfig, FetchConfig, OutputConfig, RenderConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;

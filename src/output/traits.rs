//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and
//! the data carried into the final crawl summary.

use crate::output::stats::CrawlStatistics;
use crate::record::PageRecord;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Everything the summary file reports about one run
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Run metadata
    pub seed: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub termination: String,
    pub config_hash: Option<String>,

    pub statistics: CrawlStatistics,

    /// Shard files, in write order
    pub shard_files: Vec<PathBuf>,

    /// Per-page text files, in write order
    pub text_files: Vec<PathBuf>,
}

impl CrawlSummary {
    /// Returns the run duration in whole seconds
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }
}

/// Trait for output handlers
///
/// Output handlers persist page records as they are produced and write the
/// summary at the end of the run. Implementations must be thread-safe.
pub trait OutputHandler: Send + Sync {
    /// Persists one page record
    ///
    /// # Returns
    ///
    /// The text file written for the page, if any
    fn record_page(&self, record: &PageRecord) -> OutputResult<Option<PathBuf>>;

    /// Returns the shard files written so far
    fn shard_files(&self) -> Vec<PathBuf>;

    /// Returns the text files written so far
    fn text_files(&self) -> Vec<PathBuf>;

    /// Flushes outstanding data and writes the run summary
    fn finalize(&self, summary: &CrawlSummary) -> OutputResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_duration_seconds() {
        let started_at = Utc::now();
        let summary = CrawlSummary {
            seed: "https://ex.org/docs/".to_string(),
            started_at,
            finished_at: started_at + Duration::seconds(90),
            termination: "completed".to_string(),
            config_hash: None,
            statistics: CrawlStatistics::default(),
            shard_files: Vec::new(),
            text_files: Vec::new(),
        };
        assert_eq!(summary.duration_seconds(), 90);
    }
}

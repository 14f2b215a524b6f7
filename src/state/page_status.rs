/// Page status definitions for crawl results
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal outcome of processing one frontier entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Page was fetched and extracted
    Success,

    /// Page was deliberately not extracted (non-document content type,
    /// disallowed by robots.txt). Not an error.
    Skipped,

    /// Page failed after all retries and fallbacks
    Error,
}

impl PageStatus {
    /// Returns true if this represents a successful extraction
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns true if this represents a skip
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Returns true if this represents an error
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// Returns the lowercase name used in records and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }

    /// Returns all possible statuses, in summary order
    pub fn all() -> [Self; 3] {
        [Self::Success, Self::Skipped, Self::Error]
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

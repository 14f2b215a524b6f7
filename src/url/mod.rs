//! URL handling module for Docsweep
//!
//! This module provides URL canonicalization, domain extraction, wildcard
//! matching, and the crawl scope that decides which links get followed.

mod domain;
mod normalize;
mod scope;

// Re-export main functions
pub use domain::{extract_domain, matches_wildcard, netloc};
pub use normalize::{normalize, normalize_seed};
pub use scope::{CrawlScope, LANDING_PAGES};

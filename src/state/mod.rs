//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageStatus`: Terminal outcome of one page (success, skipped, error)
//! - `CancelFlag`: Cooperative stop signal polled between pages
//! - `CrawlState`: Per-invocation counters and the idle clock

mod crawl_state;
mod page_status;

// Re-export main types
pub use crawl_state::{CancelFlag, CrawlState};
pub use page_status::PageStatus;

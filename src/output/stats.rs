//! Statistics gathered over the records of a crawl
//!
//! This module provides functionality for tallying page records and
//! displaying the result at the end of a run.

use crate::record::{FileType, PageRecord};
use crate::state::PageStatus;
use std::collections::{BTreeMap, HashMap};

/// Error records kept verbatim for the summary
const MAX_LISTED_ERRORS: usize = 50;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Total number of page records produced
    pub total_pages: u64,

    /// Count of pages by status
    pub pages_by_status: HashMap<PageStatus, u64>,

    /// Count of successful pages by file type
    pub pages_by_file_type: HashMap<FileType, u64>,

    /// Count of pages by crawl depth
    pub pages_by_depth: BTreeMap<u32, u64>,

    /// Successful pages produced by the rendering backend
    pub rendered_pages: u64,

    /// Outbound links recorded across all pages
    pub total_links: u64,

    /// Assets recorded across all pages
    pub total_assets: u64,

    /// First error records as (url, cause)
    pub errors: Vec<(String, String)>,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one record to the tallies
    pub fn observe(&mut self, record: &PageRecord) {
        self.total_pages += 1;
        *self.pages_by_status.entry(record.status).or_default() += 1;
        *self.pages_by_depth.entry(record.depth).or_default() += 1;
        self.total_links += record.out_links.len() as u64;
        self.total_assets += record.assets.len() as u64;

        match record.status {
            PageStatus::Success => {
                *self.pages_by_file_type.entry(record.file_type).or_default() += 1;
                if record.rendered {
                    self.rendered_pages += 1;
                }
            }
            PageStatus::Error if self.errors.len() < MAX_LISTED_ERRORS => {
                let cause = record.error.clone().unwrap_or_default();
                self.errors.push((record.url.clone(), cause));
            }
            _ => {}
        }
    }

    /// Returns the number of pages with the given status
    pub fn count(&self, status: PageStatus) -> u64 {
        self.pages_by_status.get(&status).copied().unwrap_or(0)
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        (self.count(PageStatus::Success) as f64 / self.total_pages as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total pages: {}", stats.total_pages);
    println!("  Rendered pages: {}", stats.rendered_pages);
    println!("  Total links found: {}", stats.total_links);
    println!("  Total assets found: {}", stats.total_assets);
    println!();

    println!("Pages by Status:");
    for status in PageStatus::all() {
        let count = stats.count(status);
        let percentage = if stats.total_pages > 0 {
            (count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    if !stats.pages_by_file_type.is_empty() {
        println!("Pages by Format:");
        for file_type in [FileType::Html, FileType::Pdf] {
            if let Some(count) = stats.pages_by_file_type.get(&file_type) {
                println!("  {}: {}", file_type.as_str(), count);
            }
        }
        println!();
    }

    if !stats.errors.is_empty() {
        println!("Errors ({}):", stats.count(PageStatus::Error));
        for (url, cause) in stats.errors.iter().take(10) {
            println!("  - {}: {}", url, cause);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully extracted)",
        stats.success_rate(),
        stats.count(PageStatus::Success),
        stats.total_pages
    );
}

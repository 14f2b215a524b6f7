//! Output module for persisting crawl results
//!
//! This module handles:
//! - Appending page records to size-bounded JSONL shards
//! - Writing a human-readable text file per extracted page
//! - Generating the markdown summary and statistics of a run

mod markdown;
mod shard;
pub mod stats;
mod text;
mod traits;
mod writer;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use shard::ShardWriter;
pub use stats::{print_statistics, CrawlStatistics};
pub use text::{render_text, sanitize_title, text_file_name, TextWriter};
pub use traits::{CrawlSummary, OutputError, OutputHandler, OutputResult};
pub use writer::{FileOutput, SUMMARY_FILE};

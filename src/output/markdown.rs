//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a crawl run,
//! including counts by status, format and depth, and the files written.

use crate::output::traits::{CrawlSummary, OutputResult};
use crate::record::FileType;
use crate::state::PageStatus;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary file
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let stats = &summary.statistics;
    let mut md = String::new();

    md.push_str("# Docsweep Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    let duration = summary.duration_seconds();
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    md.push_str(&format!("- **Status**: {}\n", summary.termination));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total Pages**: {}\n", stats.total_pages));
    md.push_str(&format!("- **Rendered Pages**: {}\n", stats.rendered_pages));
    md.push_str(&format!("- **Total Links**: {}\n", stats.total_links));
    md.push_str(&format!("- **Total Assets**: {}\n", stats.total_assets));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n\n", stats.success_rate()));

    md.push_str("## Pages by Status\n\n");
    md.push_str("| Status | Count |\n");
    md.push_str("|--------|-------|\n");
    for status in PageStatus::all() {
        md.push_str(&format!("| {} | {} |\n", status, stats.count(status)));
    }
    md.push('\n');

    md.push_str("## Pages by Format\n\n");
    md.push_str("| Format | Count |\n");
    md.push_str("|--------|-------|\n");
    for file_type in [FileType::Html, FileType::Pdf] {
        let count = stats.pages_by_file_type.get(&file_type).copied().unwrap_or(0);
        md.push_str(&format!("| {} | {} |\n", file_type.as_str(), count));
    }
    md.push('\n');

    if !stats.pages_by_depth.is_empty() {
        md.push_str("## Depth Breakdown\n\n");
        md.push_str("| Depth | Pages |\n");
        md.push_str("|-------|-------|\n");
        for (depth, count) in &stats.pages_by_depth {
            md.push_str(&format!("| {} | {} |\n", depth, count));
        }
        md.push('\n');
    }

    if !stats.errors.is_empty() {
        md.push_str("## Errors\n\n");
        md.push_str("| URL | Cause |\n");
        md.push_str("|-----|-------|\n");
        for (url, cause) in &stats.errors {
            md.push_str(&format!("| {} | {} |\n", url, cause.replace('|', "\\|")));
        }
        md.push('\n');
    }

    if !summary.shard_files.is_empty() {
        md.push_str("## Record Shards\n\n");
        for path in &summary.shard_files {
            md.push_str(&format!("- {}\n", path.display()));
        }
        md.push('\n');
    }

    if !summary.text_files.is_empty() {
        md.push_str(&format!("## Text Files ({})\n\n", summary.text_files.len()));
        for path in &summary.text_files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            md.push_str(&format!("- {}\n", name));
        }
        md.push('\n');
    }

    md
}

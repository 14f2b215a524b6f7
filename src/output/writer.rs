//! File-backed output handler
//!
//! Lays out a run's output under one directory:
//! `json/pages*.jsonl`, `text/*.txt` and `crawl_summary.md`.

use crate::config::OutputConfig;
use crate::output::markdown::generate_markdown_summary;
use crate::output::shard::ShardWriter;
use crate::output::text::TextWriter;
use crate::output::traits::{CrawlSummary, OutputHandler, OutputResult};
use crate::record::PageRecord;
use std::path::{Path, PathBuf};

/// Name of the aggregate summary file
pub const SUMMARY_FILE: &str = "crawl_summary.md";

/// Writes records, text files and the summary into an output directory
pub struct FileOutput {
    root: PathBuf,
    shards: ShardWriter,
    text: Option<TextWriter>,
    write_summary: bool,
}

impl FileOutput {
    /// Creates the output directory layout
    ///
    /// Fails when the directory cannot be created, which aborts the run
    /// before any page is fetched.
    pub fn create(config: &OutputConfig) -> OutputResult<Self> {
        let root = PathBuf::from(&config.directory);
        std::fs::create_dir_all(&root)?;

        let shards = ShardWriter::new(&root.join("json"), config.shard_limit)?;
        let text = if config.write_text {
            Some(TextWriter::new(&root.join("text"))?)
        } else {
            None
        };

        Ok(Self {
            root,
            shards,
            text,
            write_summary: config.write_summary,
        })
    }

    /// Returns the output directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl OutputHandler for FileOutput {
    fn record_page(&self, record: &PageRecord) -> OutputResult<Option<PathBuf>> {
        self.shards.append(record)?;

        match &self.text {
            Some(text) if record.is_success() => Ok(Some(text.write(record)?)),
            _ => Ok(None),
        }
    }

    fn shard_files(&self) -> Vec<PathBuf> {
        self.shards.paths()
    }

    fn text_files(&self) -> Vec<PathBuf> {
        self.text.as_ref().map(TextWriter::files).unwrap_or_default()
    }

    fn finalize(&self, summary: &CrawlSummary) -> OutputResult<()> {
        self.shards.flush()?;

        if self.write_summary {
            let path = self.root.join(SUMMARY_FILE);
            generate_markdown_summary(summary, &path)?;
            tracing::info!("Summary written to {}", path.display());
        }

        Ok(())
    }
}

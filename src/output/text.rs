//! Per-page human-readable text files

use crate::output::traits::{OutputError, OutputResult};
use crate::record::{FileType, PageRecord};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Longest sanitized title kept in a file name, in characters
const MAX_TITLE_CHARS: usize = 100;

/// Characters that are invalid in file names on common filesystems
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const MAX_LISTED_CODE_BLOCKS: usize = 10;
const MAX_LISTED_LINKS: usize = 20;
const MAX_LISTED_ASSETS: usize = 10;

struct TextState {
    next_index: usize,
    files: Vec<PathBuf>,
}

/// Writes one `.txt` file per successfully extracted page
pub struct TextWriter {
    dir: PathBuf,
    state: Mutex<TextState>,
}

impl TextWriter {
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            state: Mutex::new(TextState {
                next_index: 1,
                files: Vec::new(),
            }),
        })
    }

    /// Writes the text file of a record and returns its path
    ///
    /// Pages are numbered from 1 in the order they are written.
    pub fn write(&self, record: &PageRecord) -> OutputResult<PathBuf> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| OutputError::Write("text writer lock poisoned".to_string()))?;

        let index = state.next_index;
        let path = self.dir.join(text_file_name(index, record));

        let mut file = File::create(&path)?;
        file.write_all(render_text(index, record).as_bytes())?;

        state.next_index += 1;
        state.files.push(path.clone());
        Ok(path)
    }

    /// Returns the files written so far
    pub fn files(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .map(|state| state.files.clone())
            .unwrap_or_default()
    }
}

/// Builds `{index:03}_{[PDF]_}{title}_{timestamp}.txt`
///
/// The timestamp is the record's fetch time, so the name depends only on
/// the record and its position.
pub fn text_file_name(index: usize, record: &PageRecord) -> String {
    let marker = match record.file_type {
        FileType::Pdf => "[PDF]_",
        FileType::Html => "",
    };
    format!(
        "{:03}_{}{}_{}.txt",
        index,
        marker,
        sanitize_title(&record.title),
        record.fetched_at.format("%Y%m%d_%H%M%S")
    )
}

/// Replaces characters invalid in file names and truncates the result
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .take(MAX_TITLE_CHARS)
        .collect();

    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned
    }
}

/// Formats the body of a page's text file
pub fn render_text(index: usize, record: &PageRecord) -> String {
    let rule = "=".repeat(80);
    let thin = "-".repeat(80);
    let mut out = String::new();

    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("Page {}: {}\n", index, record.title));
    if record.file_type == FileType::Pdf {
        out.push_str("[Converted from PDF]\n");
    }
    out.push_str(&format!("{}\n", rule));
    out.push_str(&format!("URL: {}\n", record.url));
    out.push_str(&format!(
        "Fetched: {}\n",
        record.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    let format = match record.file_type {
        FileType::Pdf => "PDF",
        FileType::Html if record.rendered => "HTML (rendered)",
        FileType::Html => "HTML",
    };
    out.push_str(&format!("Format: {}\n", format));
    out.push_str(&format!("{}\n\n", rule));

    if !record.headings.is_empty() {
        out.push_str(&format!("Table of contents:\n{}\n", thin));
        for heading in &record.headings {
            let indent = "  ".repeat(heading.level.saturating_sub(1) as usize);
            out.push_str(&format!("{}• {}\n", indent, heading.text));
        }
        out.push('\n');
    }

    out.push_str(&format!("Content:\n{}\n", thin));
    out.push_str(&record.text);
    out.push_str("\n\n");

    if !record.code_blocks.is_empty() {
        out.push_str(&format!(
            "Code blocks ({}):\n{}\n",
            record.code_blocks.len(),
            thin
        ));
        for (i, block) in record.code_blocks.iter().take(MAX_LISTED_CODE_BLOCKS).enumerate() {
            out.push_str(&format!("[Code {}]\n{}\n\n", i + 1, block));
        }
        push_remainder(&mut out, record.code_blocks.len(), MAX_LISTED_CODE_BLOCKS);
    }

    if !record.out_links.is_empty() {
        out.push_str(&format!("Links ({}):\n{}\n", record.out_links.len(), thin));
        for link in record.out_links.iter().take(MAX_LISTED_LINKS) {
            out.push_str(&format!("- {}\n", link));
        }
        push_remainder(&mut out, record.out_links.len(), MAX_LISTED_LINKS);
        out.push('\n');
    }

    if !record.assets.is_empty() {
        out.push_str(&format!("Images ({}):\n{}\n", record.assets.len(), thin));
        for asset in record.assets.iter().take(MAX_LISTED_ASSETS) {
            out.push_str(&format!("- {}", asset.src));
            if let Some(alt) = asset.alt.as_deref().filter(|a| !a.is_empty()) {
                out.push_str(&format!(" ({})", alt));
            }
            if let Some(local) = &asset.local_path {
                out.push_str(&format!(" -> {}", local));
            }
            out.push('\n');
        }
        push_remainder(&mut out, record.assets.len(), MAX_LISTED_ASSETS);
        out.push('\n');
    }

    out
}

fn push_remainder(out: &mut String, total: usize, shown: usize) {
    if total > shown {
        out.push_str(&format!("... and {} more\n", total - shown));
    }
}

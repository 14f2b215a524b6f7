//! Size-bounded JSONL shard writer
//!
//! Records are appended one per line to `pages.jsonl`; once the next line
//! would push the current shard past the character limit, the shard is
//! closed and `pages_2.jsonl`, `pages_3.jsonl`, ... follow.

use crate::output::traits::{OutputError, OutputResult};
use crate::record::PageRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

struct ShardState {
    index: usize,
    chars: usize,
    file: Option<BufWriter<File>>,
    paths: Vec<PathBuf>,
}

/// Writes page records into a sequence of size-bounded JSONL files
///
/// Rotation decisions and the character counter sit behind one lock, so
/// concurrent writers never interleave lines or overshoot a shard.
pub struct ShardWriter {
    dir: PathBuf,
    limit: usize,
    state: Mutex<ShardState>,
}

impl ShardWriter {
    /// Creates a writer storing shards in `dir`
    ///
    /// The first shard file is created lazily on the first record.
    pub fn new(dir: &Path, limit: usize) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            limit,
            state: Mutex::new(ShardState {
                index: 0,
                chars: 0,
                file: None,
                paths: Vec::new(),
            }),
        })
    }

    /// Appends one record as a JSON line
    ///
    /// A record larger than the limit on its own still gets written, alone,
    /// into a fresh shard.
    pub fn append(&self, record: &PageRecord) -> OutputResult<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let len = line.chars().count();

        let mut state = self
            .state
            .lock()
            .map_err(|_| OutputError::Write("shard writer lock poisoned".to_string()))?;

        let must_rotate = state.file.is_none() || (state.chars > 0 && state.chars + len > self.limit);
        if must_rotate {
            self.rotate(&mut state)?;
        }

        if let Some(file) = state.file.as_mut() {
            file.write_all(line.as_bytes())?;
            file.flush()?;
        }
        state.chars += len;

        Ok(())
    }

    /// Returns the shard files opened so far
    pub fn paths(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .map(|state| state.paths.clone())
            .unwrap_or_default()
    }

    /// Flushes the open shard
    pub fn flush(&self) -> OutputResult<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| OutputError::Write("shard writer lock poisoned".to_string()))?;
        if let Some(file) = state.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }

    fn rotate(&self, state: &mut ShardState) -> OutputResult<()> {
        if let Some(mut file) = state.file.take() {
            file.flush()?;
        }

        state.index += 1;
        let path = self.dir.join(shard_name(state.index));
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        tracing::debug!("Opened shard {}", path.display());
        state.file = Some(BufWriter::new(file));
        state.chars = 0;
        state.paths.push(path);
        Ok(())
    }
}

/// File name of the shard with the given 1-based index
fn shard_name(index: usize) -> String {
    if index <= 1 {
        "pages.jsonl".to_string()
    } else {
        format!("pages_{}.jsonl", index)
    }
}

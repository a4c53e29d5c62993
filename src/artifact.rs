//! Artifacts: the `word count` text files exchanged through the work directory.
//!
//! Every artifact holds one `<word> <count>` pair per line, in no particular
//! order. Mapper outputs are keyed by chunk id and kept after a run, reducer
//! outputs are keyed by task id and removed by the master once merged.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::WordCounts;

/// The directory all artifacts of a run are read from and written to.
///
/// Cheap to clone; services hand a copy to each blocking task.
#[derive(Clone, Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the mapper output for chunk `chunk_id`.
    pub fn map_output(&self, chunk_id: i64) -> PathBuf {
        self.dir.join(format!("map_output_{chunk_id}.txt"))
    }

    /// Path of the reducer output for task `task_id`.
    pub fn reduce_output(&self, task_id: i64) -> PathBuf {
        self.dir.join(format!("reduce_output_{task_id}.tmp"))
    }

    /// Resolves a final output name against the work directory.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(name)
    }
}

/// Writes `counts` to `path`, replacing whatever was there.
pub fn write_counts(path: &Path, counts: &WordCounts) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for (word, count) in counts {
        writeln!(writer, "{word} {count}").with_context(|| format!("Failed to write file {}", path.display()))?;
    }
    writer.flush().with_context(|| format!("Failed to write file {}", path.display()))?;
    Ok(())
}

/// Reads the artifact at `path` in full and parses it with [`parse_counts`].
pub fn read_counts(path: &Path) -> Result<WordCounts> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read file {}", path.display()))?;
    Ok(parse_counts(&content, &path.display().to_string()))
}

/// Removes the artifact at `path`.
pub fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path).with_context(|| format!("Failed to remove file {}", path.display()))
}

/// Parses artifact text into counts, summing repeated words.
///
/// Empty lines are ignored. Other lines that are not exactly `<word> <count>` or
/// whose count is not a non-negative integer are skipped with a warning naming
/// `source`.
pub fn parse_counts(content: &str, source: &str) -> WordCounts {
    let mut counts = WordCounts::new();
    for line in content.lines() {
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Some((word, count)) => *counts.entry(word.to_string()).or_insert(0) += count,
            None => warn!("Invalid line format in {}: {:?}", source, line),
        }
    }
    counts
}

fn parse_line(line: &str) -> Option<(&str, u64)> {
    let mut fields = line.split_whitespace();
    let (word, count) = (fields.next()?, fields.next()?);
    if fields.next().is_some() {
        return None;
    }
    Some((word, count.parse().ok()?))
}

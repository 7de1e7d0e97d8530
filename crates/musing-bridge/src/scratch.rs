//! Scratch notes, one directory per day
//!
//! Layout: `<root>/<YYYY-MM-DD>/<HHMMSS>-<kind>-<id8>.md`
//!
//! Clearing removes every day directory and reports how many files went with
//! them. Loose files directly under the root are not touched.

use chrono::{DateTime, NaiveDate, Utc};
use musing_core::{InsightRecord, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn day_dir(&self, day: NaiveDate) -> PathBuf {
        self.root.join(day.format("%Y-%m-%d").to_string())
    }

    /// Write an insight as a Markdown note under the day it was observed.
    pub fn record(&self, record: &InsightRecord) -> Result<PathBuf> {
        let dir = self.day_dir(record.created_at.date_naive());
        fs::create_dir_all(&dir)?;

        let path = dir.join(note_name(record.created_at, record));
        let body = format!(
            "# {} insight ({}/10)\n\n{}\n\n- id: {}\n- observed: {}\n",
            record.kind,
            record.significance,
            record.content.trim(),
            record.id,
            record.created_at.to_rfc3339(),
        );
        fs::write(&path, body)?;
        debug!("Scratch note written: {}", path.display());
        Ok(path)
    }

    /// Remove every day directory. Returns the number of files removed.
    /// A missing root is not an error; a day that cannot be removed is
    /// logged and skipped.
    pub fn clear(&self) -> Result<usize> {
        if !self.root.is_dir() {
            return Ok(0);
        }

        let days: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        let removed = remove_days(&days);

        info!("Cleared scratch {}: {} files", self.root.display(), removed);
        Ok(removed)
    }
}

/// Remove each directory, counting the files that went with the ones removed.
fn remove_days(days: &[PathBuf]) -> usize {
    let mut removed = 0;
    for day in days {
        let files = WalkDir::new(day)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();
        match fs::remove_dir_all(day) {
            Ok(()) => removed += files,
            Err(e) => warn!("Failed to clear {}: {}", day.display(), e),
        }
    }
    removed
}

fn note_name(at: DateTime<Utc>, record: &InsightRecord) -> String {
    let short: String = record
        .id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(8)
        .collect();
    format!("{}-{}-{}.md", at.format("%H%M%S"), record.kind, short)
}

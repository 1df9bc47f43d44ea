//! File-backed persistence for the clock delta.
//!
//! The delta is stored as a small JSON object keyed by
//! [`TIME_DELTA_KEY`](crate::http::TIME_DELTA_KEY), so successive runs can
//! start signed with the last known offset instead of paying a resync.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde_json::{Map, Value};

use crate::http::{ClockDeltaSink, TIME_DELTA_KEY};

/// [`ClockDeltaSink`] that writes each new delta to a JSON file.
#[derive(Debug, Clone)]
pub struct FileClockDeltaSink {
    path: PathBuf,
}

impl FileClockDeltaSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, key: &str, value: i64) -> Result<()> {
        let mut entries = read_entries(&self.path)?.unwrap_or_default();
        entries.insert(key.to_string(), Value::from(value));

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create parent directories")?;
        }
        let contents = serde_json::to_vec_pretty(&entries).context("Failed to encode clock delta")?;
        fs::write(&self.path, contents).with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

impl ClockDeltaSink for FileClockDeltaSink {
    fn store(&self, key: &str, value: i64) {
        match self.write(key, value) {
            Ok(()) => debug!(path:% = self.path.display(), time_delta = value; "Clock delta persisted"),
            Err(e) => warn!(path:% = self.path.display(), error:? = e; "Could not persist clock delta"),
        }
    }
}

/// Reads a delta previously written by [`FileClockDeltaSink`].
///
/// Returns `Ok(None)` when the file does not exist or holds no delta.
pub fn load_time_delta(path: &Path) -> Result<Option<i64>> {
    let Some(entries) = read_entries(path)? else {
        return Ok(None);
    };

    match entries.get(TIME_DELTA_KEY) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .with_context(|| format!("{} in {} is not an integer", TIME_DELTA_KEY, path.display())),
    }
}

fn read_entries(path: &Path) -> Result<Option<Map<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let entries = serde_json::from_slice(&contents).with_context(|| format!("{} is not a JSON object", path.display()))?;
    Ok(Some(entries))
}

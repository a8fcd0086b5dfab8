//! Temp-dir audio files with explicit ownership.
//!
//! Every capture, reply, and synthesis output is an [`Artifact`]: a uniquely
//! named WAV in the system temp directory that is deleted when its owner
//! drops it. Files that must outlive the exchange (reply audio handed to the
//! player) are released with [`Artifact::into_path`]. Anything left behind by
//! crashed or historical sessions is reclaimed by [`sweep`].

use std::fs;
use std::io::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::Builder;
use tracing::debug;

pub const INPUT_PREFIX: &str = "input_";
pub const REPLY_PREFIX: &str = "reply_";
pub const TTS_PREFIX: &str = "tts_";

const PREFIXES: [&str; 3] = [INPUT_PREFIX, REPLY_PREFIX, TTS_PREFIX];

/// A uniquely named WAV file in the temp directory. Deleted on drop unless
/// ownership is taken with [`Artifact::into_path`].
#[derive(Debug)]
pub struct Artifact {
    path: tempfile::TempPath,
}

impl Artifact {
    /// Create an empty artifact in the system temp directory.
    pub fn create(prefix: &str) -> Result<Self> {
        Self::create_in(prefix, std::env::temp_dir())
    }

    /// Create an empty artifact in a specific directory.
    pub fn create_in(prefix: &str, dir: impl AsRef<Path>) -> Result<Self> {
        let file = Builder::new()
            .prefix(prefix)
            .suffix(".wav")
            .tempfile_in(dir)?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size in bytes; zero for a file that failed to materialize.
    pub fn len(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Disarm the drop-delete and hand the path to the caller, who now owns
    /// the file's lifetime (subject to the retention [`sweep`]).
    pub fn into_path(self) -> Result<PathBuf> {
        self.path.keep().map_err(|e| e.error)
    }
}

/// Remove artifacts in `dir` older than `retention`. Returns how many files
/// were deleted. Files that disappear mid-scan are skipped, not errors.
pub fn sweep_dir(dir: impl AsRef<Path>, retention: Duration) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.ends_with(".wav") || !PREFIXES.iter().any(|p| name.starts_with(p)) {
            continue;
        }
        let stale = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.elapsed().ok())
            .map(|age| age > retention)
            .unwrap_or(false);
        if stale && fs::remove_file(entry.path()).is_ok() {
            debug!(file = %name, "swept stale audio artifact");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Sweep the system temp directory.
pub fn sweep(retention: Duration) -> Result<usize> {
    sweep_dir(std::env::temp_dir(), retention)
}

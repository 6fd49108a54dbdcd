//! Destinations for generated files.
//!
//! The generator hands each rendered file to an [`OutputSink`]. Writing to
//! disk, comparing against disk and collecting in memory are separate sinks
//! so the generator itself never touches the filesystem.

use crate::error::WriteError;
use similar::{ChangeTag, TextDiff};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Receives generated files one at a time.
pub trait OutputSink {
    fn write(&mut self, file_name: &str, text: &str) -> Result<(), WriteError>;
}

/// Writes files into a directory.
///
/// Each file goes to a temporary file in the target directory first and is
/// renamed into place, so a failed write never leaves a truncated file.
#[derive(Debug, Clone)]
pub struct FsSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl FsSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Paths written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputSink for FsSink {
    fn write(&mut self, file_name: &str, text: &str) -> Result<(), WriteError> {
        let path = self.dir.join(file_name);
        let io_error = |source| WriteError::Io {
            path: path.clone(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_error)?;
        tmp.write_all(text.as_bytes()).map_err(io_error)?;
        tmp.as_file().sync_all().map_err(io_error)?;
        tmp.persist(&path).map_err(|e| WriteError::Persist {
            path: path.clone(),
            reason: e.error.to_string(),
        })?;

        debug!(path = %path.display(), bytes = text.len(), "Wrote generated file");
        self.written.push(path);
        Ok(())
    }
}

/// Compares generated files with what is already on disk.
///
/// Nothing is written. Missing or differing files are recorded with a
/// unified diff; [`CheckSink::finish`] reports them as
/// [`WriteError::Stale`].
#[derive(Debug, Clone)]
pub struct CheckSink {
    dir: PathBuf,
    stale: Vec<StaleFile>,
}

/// A generated file whose on-disk copy is missing or out of date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleFile {
    pub file_name: String,

    /// Diff from the on-disk text to the generated text.
    pub diff: String,
}

impl CheckSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stale: Vec::new(),
        }
    }

    pub fn stale(&self) -> &[StaleFile] {
        &self.stale
    }

    /// Fail if any checked file was stale.
    pub fn finish(self) -> Result<(), WriteError> {
        if self.stale.is_empty() {
            return Ok(());
        }
        Err(WriteError::Stale {
            files: self.stale.into_iter().map(|s| s.file_name).collect(),
        })
    }
}

impl OutputSink for CheckSink {
    fn write(&mut self, file_name: &str, text: &str) -> Result<(), WriteError> {
        let path = self.dir.join(file_name);
        let current = read_existing(&path)?;
        if current.as_deref() == Some(text) {
            debug!(path = %path.display(), "Generated file is up to date");
            return Ok(());
        }

        warn!(
            path = %path.display(),
            missing = current.is_none(),
            "Generated file is out of date"
        );
        self.stale.push(StaleFile {
            file_name: file_name.to_string(),
            diff: unified_diff(current.as_deref().unwrap_or(""), text),
        });
        Ok(())
    }
}

fn read_existing(path: &Path) -> Result<Option<String>, WriteError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(WriteError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Keeps generated files in memory, keyed by file name.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.files.get(file_name).map(String::as_str)
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn into_files(self) -> BTreeMap<String, String> {
        self.files
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, file_name: &str, text: &str) -> Result<(), WriteError> {
        self.files.insert(file_name.to_string(), text.to_string());
        Ok(())
    }
}

/// Line diff with `-`/`+`/` ` markers.
pub fn unified_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        output.push_str(sign);
        output.push_str(change.value());
        if !change.value().ends_with('\n') {
            output.push('\n');
        }
    }

    output
}

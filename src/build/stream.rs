//! File stream: source reading and destination writing.
//!
//! A task run reads every discovered [`SourceFile`] into a [`FileEntry`],
//! hands the entries to a compiler, and writes each result under the
//! destination directory at the entry's base-relative path.

use crate::build::SourceFile;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// I/O failure tied to the file that caused it.
#[derive(Debug, Error)]
#[error("{action} {}: {source}", .path.display())]
pub struct StreamError {
    /// What was being attempted ("Failed to read", "Failed to write")
    pub action: &'static str,
    /// File involved
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// One file flowing through a task pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path of the source file
    pub path: PathBuf,
    /// Glob base of the source file
    pub base: PathBuf,
    /// Raw file contents
    pub contents: Vec<u8>,
}

impl FileEntry {
    /// Path relative to the glob base.
    pub fn relative(&self) -> &Path {
        self.path.strip_prefix(&self.base).unwrap_or(&self.path)
    }

    /// File name starts with `_` (an import-only partial).
    pub fn is_partial(&self) -> bool {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('_'))
            .unwrap_or(false)
    }

    /// Destination path: `dest/<relative>` with the extension replaced.
    pub fn dest_path(&self, dest: &Path, extension: &str) -> PathBuf {
        dest.join(self.relative()).with_extension(extension)
    }
}

/// Read discovered source files in order.
pub fn read_sources(files: &[SourceFile]) -> Result<Vec<FileEntry>, StreamError> {
    files
        .iter()
        .map(|file| {
            let contents = fs::read(&file.path).map_err(|source| StreamError {
                action: "Failed to read",
                path: file.path.clone(),
                source,
            })?;
            Ok(FileEntry { path: file.path.clone(), base: file.base.clone(), contents })
        })
        .collect()
}

/// Entries for discovered files without reading them; `contents` stays empty.
pub fn source_entries(files: &[SourceFile]) -> Vec<FileEntry> {
    files
        .iter()
        .map(|file| FileEntry { path: file.path.clone(), base: file.base.clone(), contents: vec![] })
        .collect()
}

/// Write compiled output, creating parent directories as needed.
pub fn write_output(path: &Path, contents: &[u8]) -> Result<(), StreamError> {
    let wrap = |source| StreamError { action: "Failed to write", path: path.to_path_buf(), source };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
    }

    fs::write(path, contents).map_err(wrap)
}

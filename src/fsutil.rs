// src/fsutil.rs

//! Write-new-then-replace file helpers
//!
//! Published state (package lists, indices, digests, images, artifacts) is
//! never edited in place. Content is written to a temporary file in the
//! destination directory and renamed over the target only once complete, so
//! a failed run leaves the previous file untouched.

use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Create a temporary file next to `dest`, creating the parent directory if needed
pub fn temp_file_beside(dest: &Path) -> Result<NamedTempFile> {
    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    fs::create_dir_all(parent).map_err(|e| {
        Error::IoError(format!("Failed to create directory {}: {e}", parent.display()))
    })?;

    NamedTempFile::new_in(parent).map_err(|e| {
        Error::IoError(format!(
            "Failed to create temporary file in {}: {e}",
            parent.display()
        ))
    })
}

/// Move a completed temporary file over `dest`
pub fn persist(temp: NamedTempFile, dest: &Path) -> Result<()> {
    temp.persist(dest).map_err(|e| {
        Error::IoError(format!("Failed to replace {}: {}", dest.display(), e.error))
    })?;
    Ok(())
}

/// Atomically replace `dest` with `contents`
pub fn write_atomic(dest: &Path, contents: &[u8]) -> Result<()> {
    let mut temp = temp_file_beside(dest)?;
    temp.write_all(contents)
        .and_then(|_| temp.flush())
        .map_err(|e| Error::IoError(format!("Failed to write {}: {e}", dest.display())))?;
    persist(temp, dest)
}

/// Remove a file if it exists
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::IoError(format!(
            "Failed to remove {}: {e}",
            path.display()
        ))),
    }
}

// src/archive.rs

//! Zip archive utilities
//!
//! Addon packages are zip archives with `addon.xml` at the archive root.
//! This module opens them defensively (a corrupt archive is an error, never
//! a panic or a partial read), looks up individual entries, and produces
//! new archives from a checked-out source tree.

use crate::error::{Error, Result};
use crate::fsutil;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Directory names never copied into a snapshot archive
const EXCLUDED_DIRS: &[&str] = &[".git"];

/// Open a zip archive, mapping any failure to `CorruptArchive`
pub fn open(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| {
        Error::IoError(format!("Failed to open {}: {e}", path.display()))
    })?;

    ZipArchive::new(file).map_err(|e| corrupt(path, e))
}

/// Read a single file entry by exact archive path
///
/// Returns `Ok(None)` when the archive has no file entry with that name.
pub fn read_entry(path: &Path, entry_name: &str) -> Result<Option<Vec<u8>>> {
    let mut archive = open(path)?;
    read_entry_from(&mut archive, path, entry_name)
}

/// Read a single file entry from an already opened archive
pub fn read_entry_from(
    archive: &mut ZipArchive<File>,
    path: &Path,
    entry_name: &str,
) -> Result<Option<Vec<u8>>> {
    let mut entry = match archive.by_name(entry_name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(corrupt(path, e)),
    };

    if entry.is_dir() {
        return Ok(None);
    }

    let mut content = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut content)
        .map_err(|e| corrupt(path, e))?;

    Ok(Some(content))
}

/// List file entries (directories skipped) as `(name, index)`, sorted by name
pub fn sorted_file_entries(archive: &mut ZipArchive<File>, path: &Path) -> Result<Vec<(String, usize)>> {
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(|e| corrupt(path, e))?;
        if entry.is_dir() {
            continue;
        }
        entries.push((entry.name().to_string(), index));
    }

    entries.sort();
    Ok(entries)
}

/// Archive every file under `source_dir` into a new zip at `dest`
///
/// Entries are added in sorted path order with a fixed timestamp, and the
/// archive is written to a temporary file that only replaces `dest` once
/// complete. `.git` directories are skipped.
pub fn zip_directory(source_dir: &Path, dest: &Path) -> Result<usize> {
    let temp = fsutil::temp_file_beside(dest)?;
    let mut zip = ZipWriter::new(temp);

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default())
        .unix_permissions(0o644);

    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir()
                && EXCLUDED_DIRS.iter().any(|d| e.file_name() == *d))
        });

    let mut count = 0;
    for entry in walker {
        let entry = entry.map_err(|e| {
            Error::IoError(format!("Failed to walk {}: {e}", source_dir.display()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(source_dir).map_err(|e| {
            Error::IoError(format!("Unexpected path {}: {e}", entry.path().display()))
        })?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name.as_str(), options)
            .map_err(|e| Error::IoError(format!("Failed to add {name} to archive: {e}")))?;
        let content = std::fs::read(entry.path())?;
        zip.write_all(&content)
            .map_err(|e| Error::IoError(format!("Failed to write {name} to archive: {e}")))?;
        count += 1;
    }

    let temp = zip
        .finish()
        .map_err(|e| Error::IoError(format!("Failed to finalize archive: {e}")))?;
    fsutil::persist(temp, dest)?;

    debug!("Archived {} files from {} into {}", count, source_dir.display(), dest.display());
    Ok(count)
}

fn corrupt(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::CorruptArchive {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

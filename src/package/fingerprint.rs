// src/package/fingerprint.rs

//! Artifact content fingerprints
//!
//! Release artifacts are published files, so their identity is the SHA-256
//! of the bytes as downloaded. Source snapshots are archives this tool
//! builds itself; archiving the same tree twice can produce different bytes
//! (timestamps, compression, entry order), so their identity is computed
//! over the extracted content instead.
//!
//! # Canonical content hash
//!
//! File entries (directories skipped) are visited in ascending entry-path
//! order. For each entry the hasher receives the UTF-8 path, a NUL byte, the
//! content length as eight little-endian bytes, then the content itself.

use crate::archive;
use crate::error::{Error, Result};
use crate::hash::{self, Hash, HashAlgorithm, Hasher};
use std::io::Read;
use std::path::Path;
use tracing::debug;

use super::descriptor::SourceType;

/// Compute the content hash of an artifact according to its shape
pub fn fingerprint(artifact: &Path, source_type: SourceType) -> Result<Hash> {
    match source_type {
        SourceType::ReleaseArtifact => file_fingerprint(artifact),
        SourceType::SourceSnapshot => content_fingerprint(artifact),
    }
}

/// SHA-256 of the raw artifact bytes
pub fn file_fingerprint(artifact: &Path) -> Result<Hash> {
    debug!("Calculating file SHA-256 of {}", artifact.display());
    hash::hash_file(HashAlgorithm::Sha256, artifact).map_err(|e| {
        Error::IoError(format!("Failed to hash {}: {e}", artifact.display()))
    })
}

/// SHA-256 over the canonical content of a zip archive
pub fn content_fingerprint(artifact: &Path) -> Result<Hash> {
    debug!("Calculating zip content SHA-256 of {}", artifact.display());
    let mut zip = archive::open(artifact)?;
    let entries = archive::sorted_file_entries(&mut zip, artifact)?;

    let mut hasher = Hasher::new(HashAlgorithm::Sha256);
    let mut content = Vec::new();

    for (name, index) in entries {
        let mut entry = zip.by_index(index).map_err(|e| Error::CorruptArchive {
            path: artifact.display().to_string(),
            reason: e.to_string(),
        })?;

        content.clear();
        entry
            .read_to_end(&mut content)
            .map_err(|e| Error::CorruptArchive {
                path: artifact.display().to_string(),
                reason: format!("{name}: {e}"),
            })?;

        hasher.update(name.as_bytes());
        hasher.update(&[0]);
        hasher.update(&(content.len() as u64).to_le_bytes());
        hasher.update(&content);
    }

    Ok(hasher.finalize())
}

/// Whether an artifact on disk matches an expected content hash
///
/// A missing file is simply not a match; a file that cannot be hashed is
/// an error.
pub fn is_current(artifact: &Path, source_type: SourceType, expected: &str) -> Result<bool> {
    if !artifact.is_file() {
        return Ok(false);
    }
    let actual = fingerprint(artifact, source_type)?;
    Ok(actual.as_str().eq_ignore_ascii_case(expected))
}

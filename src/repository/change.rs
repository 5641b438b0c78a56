// src/repository/change.rs

//! Deciding whether a fetched package differs from what is published
//!
//! Content hashes are authoritative. A version bump with identical content
//! is not a change, and new content under an unchanged version is.

use crate::package::PackageDescriptor;
use std::fmt;

use super::manifest::PackageManifest;

/// How a fetched descriptor relates to the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// No entry for the addon id yet
    Added,
    /// An entry exists with a different content hash
    ContentChanged,
    /// An entry exists with the same content hash
    Unchanged,
}

impl Change {
    pub fn needs_publish(self) -> bool {
        !matches!(self, Change::Unchanged)
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Change::Added => "new package",
            Change::ContentChanged => "content changed",
            Change::Unchanged => "unchanged",
        })
    }
}

/// Compare `descriptor` against the manifest entry for its addon id
pub fn classify(manifest: &PackageManifest, descriptor: &PackageDescriptor) -> Change {
    match manifest.get(descriptor.addon_id()) {
        None => Change::Added,
        Some(current) if current.content_hash() == descriptor.content_hash() => Change::Unchanged,
        Some(_) => Change::ContentChanged,
    }
}

/// Whether publishing `descriptor` would change the manifest's content
pub fn needs_publish(manifest: &PackageManifest, descriptor: &PackageDescriptor) -> bool {
    classify(manifest, descriptor).needs_publish()
}

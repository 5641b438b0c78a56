// src/package/mod.rs

//! Addon packages: identity, provenance, and content fingerprints
//!
//! - [`descriptor`]: the published record of an addon and where it came from
//! - [`metadata`]: reading `addon.xml` out of an artifact
//! - [`fingerprint`]: content hashes for the two artifact shapes
//! - [`create`]: packaging a tagged addon checkout

pub mod create;
pub mod descriptor;
pub mod fingerprint;
pub mod metadata;

pub use create::{create_package, PackageOverrides};
pub use descriptor::{package_file_name, AddonInfo, FetchStrategy, PackageDescriptor, SourceType};
pub use fingerprint::{content_fingerprint, file_fingerprint, fingerprint};
pub use metadata::{addon_fragment, extract, extract_from_bytes, ADDON_DESCRIPTOR};

use crate::error::Result;
use std::path::Path;

/// Build the descriptor for a freshly fetched artifact
///
/// Fingerprints the artifact according to the strategy's shape and reads
/// its identity from `addon.xml`.
pub fn describe(artifact: &Path, source: FetchStrategy) -> Result<PackageDescriptor> {
    let content_hash = fingerprint(artifact, source.source_type())?;
    let info = extract(artifact)?;
    Ok(PackageDescriptor::new(info, source, content_hash))
}

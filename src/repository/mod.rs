// src/repository/mod.rs

//! Package lists, artifact fetching, and repository index generation
//!
//! This module provides functionality for:
//! - Downloading release artifacts and archiving source snapshots
//! - Loading, merging and saving per-platform package lists
//! - Deciding whether a fetched package needs publishing
//! - Rebuilding `addons.xml` and its digest from a package list

mod change;
mod client;
mod fetch;
mod index;
mod manifest;

pub use change::{classify, needs_publish, Change};
pub use client::RepositoryClient;
pub(crate) use client::USER_AGENT;
pub use fetch::{ArtifactFetcher, PackageFetcher};
pub use index::{
    write_index, IndexOutput, RepositoryIndexBuilder, DIGEST_FILE, INDEX_FILE, PACKAGES_DIR,
};
pub use manifest::{manifest_file_name, ManifestSet, PackageManifest};

// src/repository/index.rs

//! Repository index generation
//!
//! The index (`addons.xml`) lists the `<addon>` element of every package in
//! a manifest, copied verbatim from each artifact's `addon.xml`, in ascending
//! addon id order. Its companion `addons.xml.md5` holds the hex MD5 of the
//! document. The index is rebuilt in full each run; artifacts already
//! present in the cache with the expected content hash are reused.
//!
//! Cache layout under the platform's package directory:
//!
//! ```text
//! {cache}/{addon_id}/{package_file}
//! {cache}/{addon_id}/icon.png
//! {cache}/{addon_id}/fanart.jpg
//! ```

use crate::archive;
use crate::error::{Error, Result};
use crate::fsutil;
use crate::hash;
use crate::package::{fingerprint, metadata, PackageDescriptor};
use std::path::Path;
use tracing::{debug, info, warn};

use super::fetch::ArtifactFetcher;
use super::manifest::PackageManifest;

/// Index document file name
pub const INDEX_FILE: &str = "addons.xml";

/// Digest file name
pub const DIGEST_FILE: &str = "addons.xml.md5";

/// Directory under a platform directory holding cached artifacts
pub const PACKAGES_DIR: &str = "packages";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Image assets published next to each artifact, with the archive paths
/// they may be found at, in order of preference
const ASSETS: &[(&str, &[&str])] = &[
    ("icon.png", &["icon.png", "resources/icon.png"]),
    ("fanart.jpg", &["fanart.jpg", "resources/fanart.jpg"]),
];

/// A serialized index and its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOutput {
    pub document: String,
    /// Hex MD5 of `document`
    pub digest: String,
}

impl IndexOutput {
    /// Serialize addon fragments into an index document
    pub fn render<S: AsRef<str>>(fragments: &[S]) -> Self {
        let mut document = String::with_capacity(
            64 + fragments.iter().map(|f| f.as_ref().len() + 1).sum::<usize>(),
        );
        document.push_str(XML_DECLARATION);
        document.push('\n');
        document.push_str("<addons>\n");
        for fragment in fragments {
            document.push_str(fragment.as_ref());
            document.push('\n');
        }
        document.push_str("</addons>\n");

        let digest = hash::md5(document.as_bytes());
        Self { document, digest }
    }
}

/// Folds a manifest into an index, maintaining the artifact cache
pub struct RepositoryIndexBuilder<'a, F: ArtifactFetcher + ?Sized> {
    fetcher: &'a F,
}

impl<'a, F: ArtifactFetcher + ?Sized> RepositoryIndexBuilder<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    /// Build the index for `manifest`, caching artifacts under `cache_dir`
    pub fn build(&self, manifest: &PackageManifest, cache_dir: &Path) -> Result<IndexOutput> {
        let mut fragments = Vec::with_capacity(manifest.len());

        for descriptor in manifest {
            let addon_dir = cache_dir.join(descriptor.addon_id());
            let artifact = addon_dir.join(descriptor.package_file());

            self.ensure_artifact(descriptor, &artifact)?;

            let xml = metadata::read_descriptor(&artifact)?;
            let info = metadata::parse_addon_info(&xml)?;
            if info.addon_id() != descriptor.addon_id() {
                warn!(
                    "{} declares addon id '{}' but is listed as '{}'",
                    artifact.display(),
                    info.addon_id(),
                    descriptor.addon_id()
                );
            }
            fragments.push(metadata::addon_fragment(&xml)?.to_string());

            replace_assets(&artifact, &addon_dir)?;
        }

        let output = IndexOutput::render(&fragments);
        debug!("Index has {} addons, md5 {}", fragments.len(), output.digest);
        Ok(output)
    }

    /// Make sure `artifact` holds the content recorded for `descriptor`
    fn ensure_artifact(&self, descriptor: &PackageDescriptor, artifact: &Path) -> Result<()> {
        let source_type = descriptor.source_type();

        match fingerprint::is_current(artifact, source_type, descriptor.content_hash()) {
            Ok(true) => {
                info!("Package {} already fetched", descriptor);
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => warn!("Cached {} is unreadable, fetching again: {}", artifact.display(), e),
        }

        info!("Fetching package {}", descriptor);
        self.fetcher.fetch(descriptor.source(), artifact)?;

        let actual = fingerprint::fingerprint(artifact, source_type)?;
        if !actual.as_str().eq_ignore_ascii_case(descriptor.content_hash()) {
            fsutil::remove_if_exists(artifact)?;
            return Err(Error::ChecksumMismatch {
                expected: descriptor.content_hash().to_string(),
                actual: actual.into_string(),
            });
        }
        Ok(())
    }
}

/// Replace the published image assets of one addon from its artifact
fn replace_assets(artifact: &Path, addon_dir: &Path) -> Result<()> {
    for (asset, _) in ASSETS {
        fsutil::remove_if_exists(&addon_dir.join(asset))?;
    }

    let mut zip = archive::open(artifact)?;
    for (asset, candidates) in ASSETS {
        for candidate in *candidates {
            if let Some(content) = archive::read_entry_from(&mut zip, artifact, candidate)? {
                debug!("Extracting {} as {}", candidate, asset);
                fsutil::write_atomic(&addon_dir.join(asset), &content)?;
                break;
            }
        }
    }
    Ok(())
}

/// Atomically write `addons.xml` and `addons.xml.md5` into `dir`
pub fn write_index(dir: &Path, output: &IndexOutput) -> Result<()> {
    info!("Saving {}", dir.join(INDEX_FILE).display());
    fsutil::write_atomic(&dir.join(INDEX_FILE), output.document.as_bytes())?;
    info!("Saving {}", dir.join(DIGEST_FILE).display());
    fsutil::write_atomic(&dir.join(DIGEST_FILE), output.digest.as_bytes())
}

// src/repository/manifest.rs

//! Per-platform package lists
//!
//! A [`PackageManifest`] maps addon ids to their published descriptors. It
//! is stored as one YAML document per platform version,
//! `packages-{platform}.yml`, with keys in ascending id order so that the
//! same contents always serialize to the same bytes.

use crate::config::normalize_platform;
use crate::error::{Error, Result};
use crate::fsutil;
use crate::package::PackageDescriptor;
use regex::Regex;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Package list file name for a platform version
pub fn manifest_file_name(platform: &str) -> String {
    format!("packages-{}.yml", normalize_platform(platform))
}

static MANIFEST_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^packages-(.+)\.yml$").unwrap());

/// Addon id → descriptor for one platform version
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    packages: BTreeMap<String, PackageDescriptor>,
}

impl PackageManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a package list; a missing file or a non-mapping document is empty
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No package list at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(Error::IoError(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            }
        };

        Self::from_yaml(&content)
            .map_err(|e| Error::ParseError(format!("{}: {e}", path.display())))
    }

    /// Parse a package list document
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::new());
        }
        let document: serde_yaml::Value = serde_yaml::from_str(content)?;
        if !document.is_mapping() {
            return Ok(Self::new());
        }

        // Read from the text again: a parsed `Value` has already typed plain
        // scalars such as `2.0` as numbers.
        let entries: BTreeMap<String, PackageDescriptor> = serde_yaml::from_str(content)?;
        let mut manifest = Self::new();
        for (key, descriptor) in entries {
            if key != descriptor.addon_id() {
                warn!(
                    "Package list key '{}' does not match addon id '{}', using the addon id",
                    key,
                    descriptor.addon_id()
                );
            }
            manifest.insert(descriptor);
        }
        Ok(manifest)
    }

    /// Serialize in ascending addon id order
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.packages)?)
    }

    /// Atomically replace the package list at `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        info!("Saving {} packages to {}", self.len(), path.display());
        fsutil::write_atomic(path, self.to_yaml()?.as_bytes())
    }

    /// Return this manifest with `descriptor` replacing any entry for its id
    pub fn merge(mut self, descriptor: PackageDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    /// Replace any entry for the descriptor's id, returning the old one
    pub fn insert(&mut self, descriptor: PackageDescriptor) -> Option<PackageDescriptor> {
        self.packages
            .insert(descriptor.addon_id().to_string(), descriptor)
    }

    pub fn get(&self, addon_id: &str) -> Option<&PackageDescriptor> {
        self.packages.get(addon_id)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Descriptors in ascending addon id order
    pub fn iter(&self) -> btree_map::Values<'_, String, PackageDescriptor> {
        self.packages.values()
    }
}

impl<'a> IntoIterator for &'a PackageManifest {
    type Item = &'a PackageDescriptor;
    type IntoIter = btree_map::Values<'a, String, PackageDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Every package list found in a directory, keyed by platform version
#[derive(Debug, Clone, Default)]
pub struct ManifestSet {
    manifests: BTreeMap<String, PackageManifest>,
}

impl ManifestSet {
    /// Find `packages-{platform}.yml` files in `dir`, sorted by platform
    pub fn discover(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(dir).map_err(|e| {
            Error::IoError(format!("Failed to list {}: {e}", dir.display()))
        })?;

        let mut found = BTreeMap::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(captures) = MANIFEST_FILE.captures(name) else {
                continue;
            };

            let platform = normalize_platform(&captures[1]);
            if platform.is_empty() {
                continue;
            }
            if let Some(previous) = found.insert(platform.clone(), entry.path()) {
                warn!(
                    "Several package lists for platform '{}', ignoring {}",
                    platform,
                    previous.display()
                );
            }
        }
        Ok(found.into_iter().collect())
    }

    /// Load every package list in `dir`
    pub fn load(dir: &Path) -> Result<Self> {
        let mut manifests = BTreeMap::new();
        for (platform, path) in Self::discover(dir)? {
            let manifest = PackageManifest::load(&path)?;
            info!("Loaded {} packages for {}", manifest.len(), platform);
            manifests.insert(platform, manifest);
        }
        Ok(Self { manifests })
    }

    /// Number of platform versions
    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Total descriptors across all platform versions
    pub fn total_packages(&self) -> usize {
        self.manifests.values().map(PackageManifest::len).sum()
    }

    pub fn get(&self, platform: &str) -> Option<&PackageManifest> {
        self.manifests.get(&normalize_platform(platform))
    }

    /// `(platform, manifest)` pairs in ascending platform order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PackageManifest)> {
        self.manifests.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{Hash, HashAlgorithm};
    use crate::package::{AddonInfo, FetchStrategy};
    use proptest::prelude::*;

    fn hash(seed: u8) -> Hash {
        Hash::new(HashAlgorithm::Sha256, format!("{seed:02x}").repeat(32)).unwrap()
    }

    fn descriptor(id: &str, version: &str, seed: u8) -> PackageDescriptor {
        PackageDescriptor::new(
            AddonInfo::new(id, version),
            FetchStrategy::release(format!("owner/{id}"), &format!("v{version}"), "addon.zip"),
            hash(seed),
        )
    }

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = PackageManifest::load(&dir.path().join("packages-nexus.yml")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_non_mapping_documents_are_empty() {
        for doc in ["", "  \n", "~\n", "- a\n- b\n", "just text\n"] {
            assert!(PackageManifest::from_yaml(doc).unwrap().is_empty(), "{doc:?}");
        }
    }

    #[test]
    fn test_invalid_entry_is_parse_error() {
        let doc = "sample:\n  addon_id: sample\n  addon_version: '1'\n  type: release-artifact\n  repository: o/r\n  release_tag: v1\n  filename: a.zip\n  sha256: nothex\n";
        assert!(matches!(
            PackageManifest::from_yaml(doc),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn test_unquoted_scalars_and_legacy_lists_load() {
        let sha = "ab".repeat(32);
        let doc = format!(
            "---\n\
             plugin.video.sample:\n  \
               :type: gh-repository\n  \
               :github_repository: owner/sample\n  \
               :github_sha: 1234567\n  \
               :sha256: {sha}\n  \
               :addon_id: plugin.video.sample\n  \
               :addon_version: 2.0\n  \
               :package_file: plugin.video.sample-2.0.zip\n\
             script.tool:\n  \
               addon_id: script.tool\n  \
               addon_version: 1.10\n  \
               type: release-artifact\n  \
               repository: owner/tool\n  \
               release_tag: 2.0\n  \
               filename: tool.zip\n  \
               sha256: {sha}\n"
        );

        let manifest = PackageManifest::from_yaml(&doc).unwrap();
        assert_eq!(manifest.len(), 2);

        let sample = manifest.get("plugin.video.sample").unwrap();
        assert_eq!(sample.addon_version(), "2.0");
        assert_eq!(sample.source(), &FetchStrategy::snapshot("owner/sample", "1234567"));

        let tool = manifest.get("script.tool").unwrap();
        assert_eq!(tool.addon_version(), "1.10");
        assert_eq!(tool.source(), &FetchStrategy::release("owner/tool", "2.0", "tool.zip"));

        // Text survives a save/load cycle.
        let reloaded = PackageManifest::from_yaml(&manifest.to_yaml().unwrap()).unwrap();
        assert_eq!(reloaded, manifest);
    }

    #[test]
    fn test_merge_replaces_by_id() {
        let manifest = PackageManifest::new()
            .merge(descriptor("sample", "1.0.0", 1))
            .merge(descriptor("sample", "0.9.0", 2));

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("sample").unwrap().addon_version(), "0.9.0");
    }

    #[test]
    fn test_merge_order_serializes_ascending() {
        let manifest = PackageManifest::new()
            .merge(descriptor("b", "1", 1))
            .merge(descriptor("a", "1", 2));

        let yaml = manifest.to_yaml().unwrap();
        assert!(yaml.starts_with("a:\n"));
        assert!(yaml.contains("\nb:\n"));

        let ids: Vec<_> = manifest.iter().map(|d| d.addon_id()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(manifest_file_name("Nexus"));
        let manifest = PackageManifest::new()
            .merge(descriptor("plugin.b", "2.0", 3))
            .merge(descriptor("plugin.a", "1.0", 4));

        manifest.save(&path).unwrap();
        let first = fs::read(&path).unwrap();
        assert_eq!(PackageManifest::load(&path).unwrap(), manifest);

        PackageManifest::load(&path).unwrap().save(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_manifest_file_name_normalizes() {
        assert_eq!(manifest_file_name(" Matrix "), "packages-matrix.yml");
    }

    #[test]
    fn test_discover_and_load_set() {
        let dir = tempfile::tempdir().unwrap();
        PackageManifest::new()
            .merge(descriptor("x", "1", 5))
            .save(&dir.path().join("packages-nexus.yml"))
            .unwrap();
        PackageManifest::new()
            .merge(descriptor("x", "1", 5))
            .merge(descriptor("y", "2", 6))
            .save(&dir.path().join("packages-matrix.yml"))
            .unwrap();
        fs::write(dir.path().join("README.md"), "hello").unwrap();
        fs::write(dir.path().join("packages-.yml"), "{}").unwrap();
        fs::create_dir(dir.path().join("packages-dir.yml")).unwrap();

        let found = ManifestSet::discover(dir.path()).unwrap();
        let platforms: Vec<_> = found.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(platforms, ["matrix", "nexus"]);

        let set = ManifestSet::load(dir.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_packages(), 3);
        assert_eq!(set.get("Matrix").unwrap().len(), 2);
    }

    proptest! {
        #[test]
        fn prop_serialization_ignores_merge_order(
            ids in proptest::collection::btree_set("[a-z]{1,8}(\\.[a-z]{1,6})?", 1..12),
            seed in any::<u64>(),
        ) {
            let ids: Vec<String> = ids.into_iter().collect();
            let mut shuffled = ids.clone();
            // Deterministic permutation driven by the seed
            let n = shuffled.len();
            for i in (1..n).rev() {
                let j = (seed.rotate_left(i as u32) as usize) % (i + 1);
                shuffled.swap(i, j);
            }

            let forward = ids.iter().fold(PackageManifest::new(), |m, id| m.merge(descriptor(id, "1", 7)));
            let permuted = shuffled.iter().fold(PackageManifest::new(), |m, id| m.merge(descriptor(id, "1", 7)));

            prop_assert_eq!(forward.to_yaml().unwrap(), permuted.to_yaml().unwrap());
            let order: Vec<_> = permuted.iter().map(|d| d.addon_id().to_string()).collect();
            prop_assert_eq!(order, ids);
        }
    }
}

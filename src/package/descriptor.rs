// src/package/descriptor.rs

//! Package descriptors and fetch strategies
//!
//! A [`PackageDescriptor`] is the published record of one addon: its identity,
//! where it was fetched from, and the content hash of the artifact. The
//! package file name is always derived from id and version; it is written
//! to package lists for readability but ignored when read back.

use crate::error::{Error, Result};
use crate::hash::{Hash, HashAlgorithm};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix stripped from release tags given as full refs
const TAG_REF_PREFIX: &str = "refs/tags/";

/// Derive the package archive name for an addon
pub fn package_file_name(addon_id: &str, addon_version: &str) -> String {
    format!("{addon_id}-{addon_version}.zip")
}

/// Artifact shape, which decides how its content hash is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceType {
    /// Prebuilt archive downloaded verbatim from a release
    ReleaseArtifact,
    /// Archive produced locally from a source checkout
    SourceSnapshot,
}

impl SourceType {
    /// Name used in package lists and on the command line
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReleaseArtifact => "release-artifact",
            Self::SourceSnapshot => "source-snapshot",
        }
    }

    /// Parse a fetch type name, accepting the legacy GitHub-specific names
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "release-artifact" | "gh-release" => Some(Self::ReleaseArtifact),
            "source-snapshot" | "gh-repository" => Some(Self::SourceSnapshot),
            _ => None,
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an addon artifact comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FetchStrategy {
    /// A file attached to a tagged release of `repository` (`owner/name`)
    ReleaseArtifact {
        repository: String,
        release_tag: String,
        filename: String,
    },
    /// A snapshot of `repository` at `commit_ref`, re-archived locally
    SourceSnapshot {
        repository: String,
        commit_ref: String,
    },
}

impl FetchStrategy {
    /// Build a release-artifact strategy, normalizing `refs/tags/` prefixes
    pub fn release(
        repository: impl Into<String>,
        release_tag: &str,
        filename: impl Into<String>,
    ) -> Self {
        let release_tag = release_tag
            .strip_prefix(TAG_REF_PREFIX)
            .unwrap_or(release_tag)
            .to_string();
        Self::ReleaseArtifact {
            repository: repository.into(),
            release_tag,
            filename: filename.into(),
        }
    }

    /// Build a source-snapshot strategy
    pub fn snapshot(repository: impl Into<String>, commit_ref: impl Into<String>) -> Self {
        Self::SourceSnapshot {
            repository: repository.into(),
            commit_ref: commit_ref.into(),
        }
    }

    /// Build a strategy from loose fetch options, as given on the command line
    ///
    /// Fails with `ConfigError` naming the first missing field, before any I/O.
    pub fn from_options(
        fetch_type: &str,
        repository: Option<&str>,
        release_tag: Option<&str>,
        filename: Option<&str>,
        commit_ref: Option<&str>,
    ) -> Result<Self> {
        let source_type = SourceType::parse(fetch_type).ok_or_else(|| {
            Error::ConfigError(format!(
                "Unknown fetch type '{fetch_type}' (expected release-artifact or source-snapshot)"
            ))
        })?;

        let repository = required("repository", repository)?;
        let strategy = match source_type {
            SourceType::ReleaseArtifact => Self::release(
                repository,
                required("release tag", release_tag)?,
                required("release filename", filename)?,
            ),
            SourceType::SourceSnapshot => {
                Self::snapshot(repository, required("commit reference", commit_ref)?)
            }
        };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Check that every field the strategy needs is present
    pub fn validate(&self) -> Result<()> {
        let fields: Vec<(&str, &str)> = match self {
            Self::ReleaseArtifact {
                repository,
                release_tag,
                filename,
            } => vec![
                ("repository", repository.as_str()),
                ("release tag", release_tag.as_str()),
                ("release filename", filename.as_str()),
            ],
            Self::SourceSnapshot {
                repository,
                commit_ref,
            } => vec![
                ("repository", repository.as_str()),
                ("commit reference", commit_ref.as_str()),
            ],
        };

        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::ConfigError(format!("Missing {name} for addon fetch")));
            }
        }
        if !self.repository().contains('/') {
            return Err(Error::ConfigError(format!(
                "Repository '{}' must be given as owner/name",
                self.repository()
            )));
        }
        Ok(())
    }

    /// The artifact shape this strategy produces
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::ReleaseArtifact { .. } => SourceType::ReleaseArtifact,
            Self::SourceSnapshot { .. } => SourceType::SourceSnapshot,
        }
    }

    /// Source repository as `owner/name`
    pub fn repository(&self) -> &str {
        match self {
            Self::ReleaseArtifact { repository, .. } | Self::SourceSnapshot { repository, .. } => {
                repository
            }
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReleaseArtifact {
                repository,
                release_tag,
                filename,
            } => write!(f, "{repository}@{release_tag}/{filename}"),
            Self::SourceSnapshot {
                repository,
                commit_ref,
            } => write!(f, "{repository}#{commit_ref}"),
        }
    }
}

fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::ConfigError(format!("Missing {name} for addon fetch")))
}

/// Addon identity read from its `addon.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonInfo {
    addon_id: String,
    addon_version: String,
    package_file: String,
}

impl AddonInfo {
    pub fn new(addon_id: impl Into<String>, addon_version: impl Into<String>) -> Self {
        let addon_id = addon_id.into();
        let addon_version = addon_version.into();
        let package_file = package_file_name(&addon_id, &addon_version);
        Self {
            addon_id,
            addon_version,
            package_file,
        }
    }

    pub fn addon_id(&self) -> &str {
        &self.addon_id
    }

    pub fn addon_version(&self) -> &str {
        &self.addon_version
    }

    pub fn package_file(&self) -> &str {
        &self.package_file
    }
}

/// The published record of one addon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "DescriptorRecord", try_from = "DescriptorRecord")]
pub struct PackageDescriptor {
    info: AddonInfo,
    source: FetchStrategy,
    content_hash: Hash,
}

impl PackageDescriptor {
    pub fn new(info: AddonInfo, source: FetchStrategy, content_hash: Hash) -> Self {
        Self {
            info,
            source,
            content_hash,
        }
    }

    pub fn addon_id(&self) -> &str {
        self.info.addon_id()
    }

    pub fn addon_version(&self) -> &str {
        self.info.addon_version()
    }

    /// Always `"{addon_id}-{addon_version}.zip"`
    pub fn package_file(&self) -> &str {
        self.info.package_file()
    }

    pub fn info(&self) -> &AddonInfo {
        &self.info
    }

    pub fn source(&self) -> &FetchStrategy {
        &self.source
    }

    pub fn source_type(&self) -> SourceType {
        self.source.source_type()
    }

    /// Hex SHA-256 of the canonical artifact content
    pub fn content_hash(&self) -> &str {
        self.content_hash.as_str()
    }
}

impl fmt::Display for PackageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.addon_id(), self.addon_version())
    }
}

/// On-disk shape of a descriptor in a package list
///
/// Lists written by earlier tooling use `github_*` field names and
/// symbol-style keys (`:type:`); both are read, only the current names are
/// written. Values are read as plain strings, so unquoted versions, tags
/// and commit ids such as `2.0` or `1234567` keep their exact text.
#[derive(Serialize, Deserialize)]
struct DescriptorRecord {
    #[serde(alias = ":addon_id")]
    addon_id: String,
    #[serde(alias = ":addon_version")]
    addon_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = ":package_file")]
    package_file: Option<String>,
    #[serde(rename = "type", alias = ":type")]
    source_type: String,
    #[serde(alias = "github_repository", alias = ":github_repository")]
    repository: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "github_release",
        alias = ":github_release"
    )]
    release_tag: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "github_filename",
        alias = ":github_filename"
    )]
    filename: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "github_sha",
        alias = ":github_sha"
    )]
    commit_ref: Option<String>,
    #[serde(alias = ":sha256")]
    sha256: String,
}

impl From<PackageDescriptor> for DescriptorRecord {
    fn from(desc: PackageDescriptor) -> Self {
        let source_type = desc.source.source_type().as_str().to_string();
        let (repository, release_tag, filename, commit_ref) = match desc.source {
            FetchStrategy::ReleaseArtifact {
                repository,
                release_tag,
                filename,
            } => (repository, Some(release_tag), Some(filename), None),
            FetchStrategy::SourceSnapshot {
                repository,
                commit_ref,
            } => (repository, None, None, Some(commit_ref)),
        };

        Self {
            package_file: Some(desc.info.package_file),
            addon_id: desc.info.addon_id,
            addon_version: desc.info.addon_version,
            source_type,
            repository,
            release_tag,
            filename,
            commit_ref,
            sha256: desc.content_hash.value,
        }
    }
}

impl TryFrom<DescriptorRecord> for PackageDescriptor {
    type Error = String;

    fn try_from(record: DescriptorRecord) -> std::result::Result<Self, Self::Error> {
        if record.addon_id.trim().is_empty() {
            return Err("package entry has an empty addon_id".to_string());
        }
        if record.addon_version.trim().is_empty() {
            return Err(format!("package '{}' has an empty addon_version", record.addon_id));
        }
        let source = FetchStrategy::from_options(
            &record.source_type,
            Some(&record.repository),
            record.release_tag.as_deref(),
            record.filename.as_deref(),
            record.commit_ref.as_deref(),
        )
        .map_err(|e| format!("package '{}': {e}", record.addon_id))?;
        let content_hash = Hash::new(HashAlgorithm::Sha256, record.sha256)
            .map_err(|e| format!("package '{}': {e}", record.addon_id))?;

        // Stored package_file is informational; identity always re-derives it.
        Ok(Self::new(
            AddonInfo::new(record.addon_id, record.addon_version),
            source,
            content_hash,
        ))
    }
}

// src/package/create.rs

//! Packaging a tagged addon checkout

use crate::error::{Error, Result};
use crate::vcs::VersionControl;
use std::path::{Path, PathBuf};
use tracing::info;

use super::descriptor::package_file_name;
use super::metadata::{extract_from_bytes, ADDON_DESCRIPTOR};

/// Explicit values that take precedence over the tagged `addon.xml`
#[derive(Debug, Clone, Default)]
pub struct PackageOverrides {
    pub file: Option<PathBuf>,
    pub addon_id: Option<String>,
    pub addon_version: Option<String>,
}

/// Archive `tag` of the repository at `repo` into an addon package
///
/// The archive is named `{addon_id}-{addon_version}.zip` from the tagged
/// `addon.xml` unless overridden. Returns the path written.
pub fn create_package<V: VersionControl + ?Sized>(
    vcs: &V,
    repo: &Path,
    tag: &str,
    overrides: &PackageOverrides,
) -> Result<PathBuf> {
    let descriptor = vcs
        .show_file(repo, tag, ADDON_DESCRIPTOR)?
        .ok_or_else(|| Error::MissingDescriptor {
            artifact: format!("{}@{tag}", repo.display()),
            descriptor: ADDON_DESCRIPTOR.to_string(),
        })?;
    let info = extract_from_bytes(&descriptor)?;

    let addon_id = overrides.addon_id.as_deref().unwrap_or(info.addon_id());
    let addon_version = overrides
        .addon_version
        .as_deref()
        .unwrap_or(info.addon_version());
    let file = overrides
        .file
        .clone()
        .unwrap_or_else(|| PathBuf::from(package_file_name(addon_id, addon_version)));

    info!("Packaging {} v{} from {} into {}", addon_id, addon_version, tag, file.display());
    vcs.archive(repo, tag, &file)?;
    Ok(file)
}

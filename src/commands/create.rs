// src/commands/create.rs
//! Addon packaging command

use addonrepo::package::{create_package, PackageOverrides};
use addonrepo::vcs::GitCli;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Archive `tag` of a local addon repository and print the written file name
pub fn cmd_create_package(
    repository_path: &Path,
    tag: &str,
    file: Option<PathBuf>,
    addon_id: Option<String>,
    addon_version: Option<String>,
) -> Result<()> {
    let vcs = GitCli::new()?;
    let overrides = PackageOverrides {
        file,
        addon_id,
        addon_version,
    };

    let written = create_package(&vcs, repository_path, tag, &overrides).with_context(|| {
        format!("Failed to package {} at {}", repository_path.display(), tag)
    })?;

    println!("{}", written.display());
    Ok(())
}

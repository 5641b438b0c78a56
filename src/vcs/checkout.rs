// src/vcs/checkout.rs

//! Scoped working copies
//!
//! A [`Checkout`] owns the temporary directory it was cloned into. Dropping
//! it removes the directory, whether the run that used it succeeded or not.

use crate::error::{Error, Result};
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

use super::VersionControl;

/// A temporary clone of a remote branch or commit
#[derive(Debug)]
pub struct Checkout {
    dir: TempDir,
}

impl Checkout {
    /// Clone `branch` of `url` into a fresh directory under `work_dir`
    pub fn branch<V: VersionControl + ?Sized>(
        vcs: &V,
        work_dir: &Path,
        url: &str,
        branch: &str,
    ) -> Result<Self> {
        let checkout = Self::empty(work_dir, "clone-")?;
        vcs.clone_branch(url, branch, checkout.path())?;
        Ok(checkout)
    }

    /// Fetch `commit` of `url` into a fresh directory under `work_dir`
    pub fn commit<V: VersionControl + ?Sized>(
        vcs: &V,
        work_dir: &Path,
        url: &str,
        commit: &str,
    ) -> Result<Self> {
        let checkout = Self::empty(work_dir, "snapshot-")?;
        vcs.clone_at_commit(url, commit, checkout.path())?;
        Ok(checkout)
    }

    /// An empty scoped directory under `work_dir`
    pub fn empty(work_dir: &Path, prefix: &str) -> Result<Self> {
        std::fs::create_dir_all(work_dir).map_err(|e| {
            Error::IoError(format!(
                "Failed to create work directory {}: {e}",
                work_dir.display()
            ))
        })?;

        let dir = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(work_dir)
            .map_err(|e| {
                Error::IoError(format!(
                    "Failed to create temporary directory in {}: {e}",
                    work_dir.display()
                ))
            })?;

        debug!("Created scoped directory {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Root of the working copy
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

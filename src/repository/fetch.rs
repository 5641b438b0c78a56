// src/repository/fetch.rs

//! Resolving fetch strategies into local artifacts

use crate::archive;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::package::FetchStrategy;
use crate::vcs::{Checkout, VersionControl};
use std::path::Path;
use tracing::info;

use super::client::RepositoryClient;

/// Something that can place the artifact described by a strategy at a path
pub trait ArtifactFetcher {
    /// Fetch the artifact for `strategy` into `dest`, replacing it only on success
    fn fetch(&self, strategy: &FetchStrategy, dest: &Path) -> Result<()>;
}

/// Fetches release artifacts over HTTP and source snapshots through version control
pub struct PackageFetcher<'a, V: VersionControl> {
    config: &'a Config,
    vcs: &'a V,
    client: RepositoryClient,
}

impl<'a, V: VersionControl> PackageFetcher<'a, V> {
    pub fn new(config: &'a Config, vcs: &'a V) -> Result<Self> {
        Ok(Self {
            config,
            vcs,
            client: RepositoryClient::new()?,
        })
    }

    fn fetch_release(
        &self,
        repository: &str,
        release_tag: &str,
        filename: &str,
        dest: &Path,
    ) -> Result<()> {
        let url = self.config.release_url(repository, release_tag, filename)?;
        self.client.download_file(&url, dest)?;
        Ok(())
    }

    fn fetch_snapshot(&self, repository: &str, commit_ref: &str, dest: &Path) -> Result<()> {
        let url = self.config.clone_url(repository)?;
        let checkout = Checkout::commit(self.vcs, &self.config.work_dir, &url, commit_ref)
            .map_err(|e| {
                Error::FetchFailed(format!("Failed to fetch {repository}#{commit_ref}: {e}"))
            })?;
        let files = archive::zip_directory(checkout.path(), dest)?;
        info!(
            "Archived {} files of {}#{} into {}",
            files,
            repository,
            commit_ref,
            dest.display()
        );
        Ok(())
    }
}

impl<V: VersionControl> ArtifactFetcher for PackageFetcher<'_, V> {
    fn fetch(&self, strategy: &FetchStrategy, dest: &Path) -> Result<()> {
        info!("Fetching {}", strategy);
        match strategy {
            FetchStrategy::ReleaseArtifact {
                repository,
                release_tag,
                filename,
            } => self.fetch_release(repository, release_tag, filename, dest),
            FetchStrategy::SourceSnapshot {
                repository,
                commit_ref,
            } => self.fetch_snapshot(repository, commit_ref, dest),
        }
    }
}

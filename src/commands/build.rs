// src/commands/build.rs
//! Repository index build command

use super::{report, work_dir};
use addonrepo::config::Config;
use addonrepo::publish::{PublishCoordinator, RepositoryBranch};
use addonrepo::repository::PackageFetcher;
use addonrepo::vcs::{GitCli, GitHubClient};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

/// Rebuild every platform's index from the package lists and propose the result
pub fn cmd_build_repository(
    list_owner: &str,
    list_repository: &str,
    list_branch: &str,
    pages_branch: &str,
    work_dir_override: Option<PathBuf>,
) -> Result<()> {
    let config = Config::from_env(work_dir(work_dir_override))?;
    let list = RepositoryBranch::new(list_owner, list_repository, list_branch);

    info!(
        "Building repository {} from {} into {}",
        list.repository, list.branch, pages_branch
    );

    let vcs = GitCli::new()?;
    let pulls = GitHubClient::new(&config)?;
    let fetcher = PackageFetcher::new(&config, &vcs)?;

    let outcome = PublishCoordinator::new(&config, &vcs, &pulls, &fetcher)
        .build_repository(&list, pages_branch)
        .with_context(|| format!("Failed to build repository {}", list.repository))?;

    report(&outcome);
    Ok(())
}

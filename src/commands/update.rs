// src/commands/update.rs
//! Package list update command

use super::{report, work_dir};
use addonrepo::config::{resolve_platform, Config};
use addonrepo::package::FetchStrategy;
use addonrepo::publish::{PublishCoordinator, RepositoryBranch};
use addonrepo::repository::PackageFetcher;
use addonrepo::vcs::{GitCli, GitHubClient};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

/// Options of the `update-package` command
pub struct UpdatePackageArgs {
    pub list_owner: String,
    pub list_repository: String,
    pub list_branch: String,
    pub fetch_type: String,
    pub repository: String,
    pub release_tag: Option<String>,
    pub filename: Option<String>,
    pub sha: Option<String>,
    pub platform: Option<String>,
    pub work_dir: Option<PathBuf>,
}

/// Fetch one addon and propose it for the platform's package list
pub fn cmd_update_package(args: UpdatePackageArgs) -> Result<()> {
    let config = Config::from_env(work_dir(args.work_dir))?;
    let platform = resolve_platform(args.platform.as_deref(), |key| std::env::var(key).ok())?;
    let strategy = FetchStrategy::from_options(
        &args.fetch_type,
        Some(&args.repository),
        args.release_tag.as_deref(),
        args.filename.as_deref(),
        args.sha.as_deref(),
    )?;
    let list = RepositoryBranch::new(&args.list_owner, &args.list_repository, &args.list_branch);

    info!("Updating {} package list in {} with {}", platform, list.repository, strategy);

    let vcs = GitCli::new()?;
    let pulls = GitHubClient::new(&config)?;
    let fetcher = PackageFetcher::new(&config, &vcs)?;

    let outcome = PublishCoordinator::new(&config, &vcs, &pulls, &fetcher)
        .update_package(&list, &platform, &strategy)
        .with_context(|| format!("Failed to update package list {}", list.repository))?;

    report(&outcome);
    Ok(())
}

// src/publish.rs

//! Publishing package list and repository updates
//!
//! [`PublishCoordinator`] drives both sync runs through the same sequence:
//!
//! ```text
//! Start -> PackagesFetched -> ManifestUpdated -> NoOpEnd
//!                                             -> Committed -> Pushed -> PullRequestCreated
//! ```
//!
//! After the working copy has been updated the version-control collaborator
//! is asked whether anything changed. If not, the run ends without creating
//! a branch, commit, push or pull request. Otherwise the changes are
//! committed on a new time-stamped branch, pushed, and proposed for merge.
//! Every temporary clone is removed when the run ends, on success or error.

use crate::config::Config;
use crate::error::Result;
use crate::lock::RunLock;
use crate::package::{self, FetchStrategy, PackageDescriptor};
use crate::repository::{
    classify, manifest_file_name, write_index, ArtifactFetcher, ManifestSet, PackageManifest,
    RepositoryIndexBuilder, PACKAGES_DIR,
};
use crate::vcs::{Checkout, CommitInfo, PullRequest, PullRequestInfo, PullRequestService, VersionControl};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Branch name prefix for single-package list updates
pub const PACKAGE_UPDATE_PREFIX: &str = "package-update";

/// Branch name prefix for repository index updates
pub const REPOSITORY_UPDATE_PREFIX: &str = "repository-update";

const REPOSITORY_UPDATE_MESSAGE: &str = "Repository update";

/// Progress of a publish run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Start,
    PackagesFetched,
    ManifestUpdated,
    NoOpEnd,
    Committed,
    Pushed,
    PullRequestCreated,
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::PackagesFetched => "packages fetched",
            Self::ManifestUpdated => "manifest updated",
            Self::NoOpEnd => "nothing to publish",
            Self::Committed => "committed",
            Self::Pushed => "pushed",
            Self::PullRequestCreated => "pull request created",
        })
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing changed; no branch, commit, push or pull request
    NoChange,
    /// Changes were pushed to `branch` and proposed in `pull_request`
    Published {
        branch: String,
        pull_request: PullRequestInfo,
    },
}

/// A branch of a hosted repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryBranch {
    /// `owner/name`
    pub repository: String,
    pub branch: String,
}

impl RepositoryBranch {
    pub fn new(owner: &str, name: &str, branch: &str) -> Self {
        Self {
            repository: format!("{owner}/{name}"),
            branch: branch.to_string(),
        }
    }
}

/// Commit title and body for a repository update
pub fn repository_update_message(trigger: Option<&CommitInfo>) -> (String, String) {
    match trigger {
        Some(commit) => {
            let title = format!("Repository update triggered by {}", commit.subject());
            let body = format!("{title}\n{}", commit.sha);
            (title, body)
        }
        None => (
            REPOSITORY_UPDATE_MESSAGE.to_string(),
            REPOSITORY_UPDATE_MESSAGE.to_string(),
        ),
    }
}

fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Orchestrates fetch, manifest and index updates against the collaborators
pub struct PublishCoordinator<'a, V, P, F>
where
    V: VersionControl,
    P: PullRequestService,
    F: ArtifactFetcher,
{
    config: &'a Config,
    vcs: &'a V,
    pulls: &'a P,
    fetcher: &'a F,
    state: PublishState,
    clock: fn() -> i64,
}

impl<'a, V, P, F> PublishCoordinator<'a, V, P, F>
where
    V: VersionControl,
    P: PullRequestService,
    F: ArtifactFetcher,
{
    pub fn new(config: &'a Config, vcs: &'a V, pulls: &'a P, fetcher: &'a F) -> Self {
        Self {
            config,
            vcs,
            pulls,
            fetcher,
            state: PublishState::Start,
            clock: unix_timestamp,
        }
    }

    /// Replace the source of branch-name timestamps
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Where the last run got to
    pub fn state(&self) -> PublishState {
        self.state
    }

    /// Fetch one package and record it in the platform's package list
    ///
    /// The list is only rewritten, committed and proposed when the package's
    /// content hash differs from the recorded one.
    pub fn update_package(
        &mut self,
        list: &RepositoryBranch,
        platform: &str,
        strategy: &FetchStrategy,
    ) -> Result<PublishOutcome> {
        strategy.validate()?;
        self.state = PublishState::Start;
        let _lock = RunLock::acquire(&self.config.work_dir)?;

        let descriptor = self.fetch_descriptor(strategy)?;
        info!(
            "Collected {} ({}, sha256 {})",
            descriptor,
            descriptor.package_file(),
            descriptor.content_hash()
        );
        self.advance(PublishState::PackagesFetched);

        info!("Fetching current package list from {}", self.config.display_url(&list.repository));
        let url = self.config.clone_url(&list.repository)?;
        let checkout = Checkout::branch(self.vcs, &self.config.work_dir, &url, &list.branch)?;
        let manifest_path = checkout.path().join(manifest_file_name(platform));

        let manifest = PackageManifest::load(&manifest_path)?;
        let change = classify(&manifest, &descriptor);
        info!("{}: {}", descriptor, change);
        if change.needs_publish() {
            manifest.merge(descriptor.clone()).save(&manifest_path)?;
        }
        self.advance(PublishState::ManifestUpdated);

        let message = descriptor.to_string();
        self.publish(
            checkout.path(),
            &list.repository,
            PACKAGE_UPDATE_PREFIX,
            &list.branch,
            &message,
            &message,
        )
    }

    /// Rebuild the repository index of every platform from the package lists
    ///
    /// Package lists are read from `list`; indices, artifacts and assets are
    /// written to `pages_branch` of the same repository.
    pub fn build_repository(
        &mut self,
        list: &RepositoryBranch,
        pages_branch: &str,
    ) -> Result<PublishOutcome> {
        self.state = PublishState::Start;
        let _lock = RunLock::acquire(&self.config.work_dir)?;
        let url = self.config.clone_url(&list.repository)?;

        let (manifests, trigger) = {
            let checkout = Checkout::branch(self.vcs, &self.config.work_dir, &url, &list.branch)?;
            let manifests = ManifestSet::load(checkout.path())?;
            info!("Search last commit message");
            let trigger = self.vcs.last_commit(checkout.path())?;
            (manifests, trigger)
        };

        if manifests.total_packages() == 0 {
            info!("No packages for repository");
            self.advance(PublishState::NoOpEnd);
            return Ok(PublishOutcome::NoChange);
        }

        let pages = Checkout::branch(self.vcs, &self.config.work_dir, &url, pages_branch)?;
        let builder = RepositoryIndexBuilder::new(self.fetcher);
        let mut indices = Vec::with_capacity(manifests.len());
        for (platform, manifest) in manifests.iter() {
            info!("Building index for {} ({} packages)", platform, manifest.len());
            let platform_dir = pages.path().join(platform);
            let output = builder.build(manifest, &platform_dir.join(PACKAGES_DIR))?;
            indices.push((platform_dir, output));
        }
        self.advance(PublishState::PackagesFetched);

        for (platform_dir, output) in &indices {
            write_index(platform_dir, output)?;
        }
        self.advance(PublishState::ManifestUpdated);

        let (title, body) = repository_update_message(trigger.as_ref());
        self.publish(
            pages.path(),
            &list.repository,
            REPOSITORY_UPDATE_PREFIX,
            pages_branch,
            &title,
            &body,
        )
    }

    /// Fetch into a scoped staging directory and describe the artifact
    fn fetch_descriptor(&self, strategy: &FetchStrategy) -> Result<PackageDescriptor> {
        let staging = Checkout::empty(&self.config.work_dir, "package-")?;
        let artifact = staging.path().join("package.zip");
        self.fetcher.fetch(strategy, &artifact)?;
        package::describe(&artifact, strategy.clone()).inspect_err(|e| {
            if e.is_invalid_package() {
                warn!("{} did not provide a valid addon package", strategy);
            }
        })
    }

    /// Commit, push and propose whatever changed in `repo_dir`
    fn publish(
        &mut self,
        repo_dir: &Path,
        repository: &str,
        branch_prefix: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PublishOutcome> {
        if !self.vcs.has_changes(repo_dir)? {
            info!("No changes, nothing to publish");
            self.advance(PublishState::NoOpEnd);
            return Ok(PublishOutcome::NoChange);
        }

        let branch = format!("{branch_prefix}-{}", (self.clock)());
        info!("Changes found, committing to {}", branch);
        self.vcs.create_branch(repo_dir, &branch)?;
        self.vcs.commit_all(repo_dir, body, &self.config.identity)?;
        self.advance(PublishState::Committed);

        self.vcs.push(repo_dir, &branch)?;
        self.advance(PublishState::Pushed);

        let pull_request = self.pulls.create_pull_request(
            repository,
            &PullRequest {
                title: title.to_string(),
                body: body.to_string(),
                head: branch.clone(),
                base: base.to_string(),
            },
        )?;
        self.advance(PublishState::PullRequestCreated);

        Ok(PublishOutcome::Published {
            branch,
            pull_request,
        })
    }

    fn advance(&mut self, next: PublishState) {
        debug!("Publish state: {} -> {}", self.state, next);
        self.state = next;
    }
}

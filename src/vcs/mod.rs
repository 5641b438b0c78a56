// src/vcs/mod.rs

//! Version-control and pull-request collaborators
//!
//! The sync logic never talks to git or the hosting service directly. It
//! goes through two narrow traits whose every operation either succeeds or
//! fails with `PublishCollaboratorError`:
//!
//! - [`VersionControl`]: clone, branch, commit, push, change detection
//! - [`PullRequestService`]: open a pull request
//!
//! [`GitCli`] and [`GitHubClient`] are the shipped implementations.

mod checkout;
mod git;
mod github;

pub use checkout::Checkout;
pub use git::GitCli;
pub use github::{GitHubClient, PullRequest, PullRequestInfo, PullRequestService};

use crate::config::GitIdentity;
use crate::error::Result;
use std::path::Path;

/// The most recent commit of a checked-out branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit id
    pub sha: String,
    /// Commit message, trimmed
    pub message: String,
}

impl CommitInfo {
    /// First line of the commit message
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim()
    }
}

/// Version-control operations used by the sync runs
pub trait VersionControl {
    /// Shallow-clone `branch` of `url` into the empty directory `dest`
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<()>;

    /// Fetch exactly `commit` of `url` into the empty directory `dest` and check it out
    fn clone_at_commit(&self, url: &str, commit: &str, dest: &Path) -> Result<()>;

    /// Whether the working tree has added, modified, deleted or untracked files
    fn has_changes(&self, repo: &Path) -> Result<bool>;

    /// Create `branch` at HEAD and switch to it
    fn create_branch(&self, repo: &Path, branch: &str) -> Result<()>;

    /// Stage everything and commit it as `identity`
    fn commit_all(&self, repo: &Path, message: &str, identity: &GitIdentity) -> Result<()>;

    /// Push local `branch` to the same-named branch on `origin`
    fn push(&self, repo: &Path, branch: &str) -> Result<()>;

    /// HEAD commit, or `None` for a repository without commits
    fn last_commit(&self, repo: &Path) -> Result<Option<CommitInfo>>;

    /// Content of `path` at revision `rev`, `None` when the path is absent there
    fn show_file(&self, repo: &Path, rev: &str, path: &str) -> Result<Option<Vec<u8>>>;

    /// Write the tree at `rev` as a zip archive to `dest`
    fn archive(&self, repo: &Path, rev: &str, dest: &Path) -> Result<()>;
}

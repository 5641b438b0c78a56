// tests/common/mod.rs

//! Shared fixtures and in-memory collaborators for integration tests.
//!
//! These drive the public API only. Unit tests use `src/testing.rs`,
//! which also fakes packaging and push failures.

#![allow(dead_code)]

use addonrepo::config::{Config, GitIdentity};
use addonrepo::package::FetchStrategy;
use addonrepo::repository::ArtifactFetcher;
use addonrepo::vcs::{CommitInfo, PullRequest, PullRequestInfo, PullRequestService, VersionControl};
use addonrepo::{Error, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Relative path to file content
pub type Tree = BTreeMap<String, Vec<u8>>;

/// Configuration with fixed credentials rooted at `work_dir`.
pub fn config(work_dir: &Path) -> Config {
    Config::from_lookup(work_dir.to_path_buf(), |key| match key {
        "GITHUB_USER" => Some("bot".to_string()),
        "GITHUB_TOKEN" => Some("t0ken".to_string()),
        "GIT_USER_NAME" => Some("Repository Bot".to_string()),
        "GIT_USER_EMAIL" => Some("bot@example.com".to_string()),
        _ => None,
    })
    .unwrap()
}

/// Write an addon zip with the given entries in the given order.
///
/// `addon.xml` is always written first, then `extra`.
pub fn write_addon_zip(
    path: &Path,
    id: &str,
    version: &str,
    extra: &[(&str, &[u8])],
    method: CompressionMethod,
) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default().compression_method(method);

    zip.start_file("addon.xml", options).unwrap();
    zip.write_all(addon_xml(id, version).as_bytes()).unwrap();
    for (name, content) in extra {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

/// A minimal `addon.xml` document.
pub fn addon_xml(id: &str, version: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<addon id=\"{id}\" version=\"{version}\" name=\"{id}\" provider-name=\"tests\">\n  <extension point=\"xbmc.python.pluginsource\" library=\"default.py\"/>\n</addon>\n"
    )
}

fn read_tree(root: &Path) -> Tree {
    let mut tree = Tree::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.unwrap();
        if entry.file_type().is_file() {
            let name = entry.path().strip_prefix(root).unwrap();
            tree.insert(
                name.to_string_lossy().replace('\\', "/"),
                fs::read(entry.path()).unwrap(),
            );
        }
    }
    tree
}

fn write_tree(root: &Path, tree: &Tree) {
    fs::create_dir_all(root).unwrap();
    for (name, content) in tree {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn collaborator_error(message: String) -> Error {
    Error::PublishCollaboratorError(message)
}

struct Working {
    url: String,
    branch: String,
    committed: Tree,
}

/// Remotes held in memory, keyed by clone URL and branch.
#[derive(Default)]
pub struct MemoryVcs {
    remotes: RefCell<HashMap<(String, String), Tree>>,
    commits: RefCell<HashMap<(String, String), CommitInfo>>,
    working: RefCell<HashMap<PathBuf, Working>>,
    log: RefCell<Vec<String>>,
}

impl MemoryVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, url: &str, branch: &str, tree: Tree) {
        self.remotes
            .borrow_mut()
            .insert((url.to_string(), branch.to_string()), tree);
    }

    pub fn set_head(&self, url: &str, branch: &str, sha: &str, message: &str) {
        self.commits.borrow_mut().insert(
            (url.to_string(), branch.to_string()),
            CommitInfo {
                sha: sha.to_string(),
                message: message.to_string(),
            },
        );
    }

    pub fn remote(&self, url: &str, branch: &str) -> Tree {
        self.remotes
            .borrow()
            .get(&(url.to_string(), branch.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Fast-forward `base` to `head`, as merging the pull request would.
    pub fn merge(&self, url: &str, head: &str, base: &str) {
        let tree = self.remote(url, head);
        self.seed(url, base, tree);
    }

    /// Mutating operations performed so far.
    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn with_working<T>(&self, repo: &Path, f: impl FnOnce(&mut Working) -> T) -> Result<T> {
        let mut working = self.working.borrow_mut();
        let state = working
            .get_mut(repo)
            .ok_or_else(|| collaborator_error(format!("{} is not a clone", repo.display())))?;
        Ok(f(state))
    }
}

impl VersionControl for MemoryVcs {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        let tree = self
            .remotes
            .borrow()
            .get(&(url.to_string(), branch.to_string()))
            .cloned()
            .ok_or_else(|| collaborator_error(format!("Remote branch {branch} not found")))?;
        write_tree(dest, &tree);
        self.working.borrow_mut().insert(
            dest.to_path_buf(),
            Working {
                url: url.to_string(),
                branch: branch.to_string(),
                committed: tree,
            },
        );
        Ok(())
    }

    fn clone_at_commit(&self, url: &str, commit: &str, dest: &Path) -> Result<()> {
        let tree = self
            .remotes
            .borrow()
            .get(&(url.to_string(), commit.to_string()))
            .cloned()
            .ok_or_else(|| collaborator_error(format!("Commit {commit} not found")))?;
        write_tree(dest, &tree);
        Ok(())
    }

    fn has_changes(&self, repo: &Path) -> Result<bool> {
        let current = read_tree(repo);
        self.with_working(repo, |state| state.committed != current)
    }

    fn create_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        self.with_working(repo, |state| state.branch = branch.to_string())?;
        self.log.borrow_mut().push(format!("branch {branch}"));
        Ok(())
    }

    fn commit_all(&self, repo: &Path, message: &str, identity: &GitIdentity) -> Result<()> {
        let current = read_tree(repo);
        self.with_working(repo, |state| state.committed = current)?;
        self.log
            .borrow_mut()
            .push(format!("commit by {}: {message}", identity.name));
        Ok(())
    }

    fn push(&self, repo: &Path, branch: &str) -> Result<()> {
        let (url, tree) =
            self.with_working(repo, |state| (state.url.clone(), state.committed.clone()))?;
        self.seed(&url, branch, tree);
        self.log.borrow_mut().push(format!("push {branch}"));
        Ok(())
    }

    fn last_commit(&self, repo: &Path) -> Result<Option<CommitInfo>> {
        let key = self.with_working(repo, |state| (state.url.clone(), state.branch.clone()))?;
        Ok(self.commits.borrow().get(&key).cloned())
    }

    fn show_file(&self, _repo: &Path, _rev: &str, _path: &str) -> Result<Option<Vec<u8>>> {
        Err(collaborator_error("packaging is not simulated".to_string()))
    }

    fn archive(&self, _repo: &Path, _rev: &str, _dest: &Path) -> Result<()> {
        Err(collaborator_error("packaging is not simulated".to_string()))
    }
}

/// Records pull requests instead of opening them.
#[derive(Default)]
pub struct RecordedPullRequests {
    opened: RefCell<Vec<(String, PullRequest)>>,
}

impl RecordedPullRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<(String, PullRequest)> {
        self.opened.borrow().clone()
    }
}

impl PullRequestService for RecordedPullRequests {
    fn create_pull_request(
        &self,
        repository: &str,
        request: &PullRequest,
    ) -> Result<PullRequestInfo> {
        let mut opened = self.opened.borrow_mut();
        opened.push((repository.to_string(), request.clone()));
        Ok(PullRequestInfo {
            number: opened.len() as u64,
            html_url: format!("https://example.invalid/{repository}/pull/{}", opened.len()),
        })
    }
}

/// Serves prebuilt artifacts keyed by fetch strategy.
#[derive(Default)]
pub struct StaticFetcher {
    artifacts: RefCell<HashMap<FetchStrategy, PathBuf>>,
    fetched: RefCell<usize>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, strategy: FetchStrategy, artifact: &Path) {
        self.artifacts
            .borrow_mut()
            .insert(strategy, artifact.to_path_buf());
    }

    pub fn fetched(&self) -> usize {
        *self.fetched.borrow()
    }
}

impl ArtifactFetcher for StaticFetcher {
    fn fetch(&self, strategy: &FetchStrategy, dest: &Path) -> Result<()> {
        *self.fetched.borrow_mut() += 1;
        let source = self
            .artifacts
            .borrow()
            .get(strategy)
            .cloned()
            .ok_or_else(|| Error::FetchFailed(format!("Not found: {strategy}")))?;
        fs::create_dir_all(dest.parent().unwrap())?;
        fs::copy(source, dest)?;
        Ok(())
    }
}

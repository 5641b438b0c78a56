// src/testing.rs

//! In-memory collaborators and fixtures for unit tests

use crate::config::{Config, GitIdentity};
use crate::error::{Error, Result};
use crate::package::FetchStrategy;
use crate::repository::ArtifactFetcher;
use crate::vcs::{CommitInfo, PullRequest, PullRequestInfo, PullRequestService, VersionControl};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub type Tree = BTreeMap<String, Vec<u8>>;

/// Configuration with fixed credentials rooted at `work_dir`
pub fn test_config(work_dir: &Path) -> Config {
    Config::from_lookup(work_dir.to_path_buf(), |key| match key {
        "GITHUB_USER" => Some("bot".into()),
        "GITHUB_TOKEN" => Some("t0ken".into()),
        "GIT_USER_NAME" => Some("Bot".into()),
        "GIT_USER_EMAIL" => Some("bot@example.com".into()),
        _ => None,
    })
    .expect("test configuration is complete")
}

/// Write a zip with an `addon.xml` for `id`/`version` plus `extra` entries
pub fn write_addon_zip(path: &Path, id: &str, version: &str, extra: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();

    zip.start_file("addon.xml", options).unwrap();
    write!(
        zip,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<addon id=\"{id}\" version=\"{version}\" name=\"{id}\">\n  <extension point=\"xbmc.addon.metadata\"/>\n</addon>\n"
    )
    .unwrap();
    for (name, content) in extra {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
}

fn read_tree(root: &Path) -> Tree {
    let mut tree = Tree::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap();
        let name = relative.to_string_lossy().replace('\\', "/");
        tree.insert(name, fs::read(entry.path()).unwrap());
    }
    tree
}

fn write_tree(root: &Path, tree: &Tree) {
    for (name, content) in tree {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn fail(message: impl Into<String>) -> Error {
    Error::PublishCollaboratorError(message.into())
}

struct CheckoutState {
    url: String,
    branch: String,
    committed: Tree,
}

/// Version control over in-memory remotes
///
/// Remotes are keyed by clone URL and branch. Every mutating operation is
/// appended to [`FakeVcs::actions`].
#[derive(Default)]
pub struct FakeVcs {
    branches: RefCell<HashMap<(String, String), Tree>>,
    snapshots: RefCell<HashMap<(String, String), Tree>>,
    commits: RefCell<HashMap<(String, String), CommitInfo>>,
    checkouts: RefCell<HashMap<PathBuf, CheckoutState>>,
    actions: RefCell<Vec<String>>,
    fail_push: RefCell<bool>,
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_branch(&self, url: &str, branch: &str, files: &[(&str, &str)]) {
        let tree = files
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect();
        self.branches
            .borrow_mut()
            .insert((url.to_string(), branch.to_string()), tree);
    }

    pub fn add_snapshot(&self, url: &str, commit: &str, files: &[(&str, &str)]) {
        let tree = files
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect();
        self.snapshots
            .borrow_mut()
            .insert((url.to_string(), commit.to_string()), tree);
    }

    pub fn set_last_commit(&self, url: &str, branch: &str, sha: &str, message: &str) {
        self.commits.borrow_mut().insert(
            (url.to_string(), branch.to_string()),
            CommitInfo {
                sha: sha.to_string(),
                message: message.to_string(),
            },
        );
    }

    pub fn branch(&self, url: &str, branch: &str) -> Option<Tree> {
        self.branches
            .borrow()
            .get(&(url.to_string(), branch.to_string()))
            .cloned()
    }

    /// Simulate merging a pushed branch into `base`
    pub fn merge(&self, url: &str, head: &str, base: &str) {
        let tree = self.branch(url, head).expect("head branch was pushed");
        self.branches
            .borrow_mut()
            .insert((url.to_string(), base.to_string()), tree);
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions.borrow().clone()
    }

    pub fn fail_push(&self) {
        *self.fail_push.borrow_mut() = true;
    }

    fn record(&self, action: String) {
        self.actions.borrow_mut().push(action);
    }
}

impl VersionControl for FakeVcs {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        let tree = self
            .branch(url, branch)
            .ok_or_else(|| fail(format!("no branch {branch} in {url}")))?;
        write_tree(dest, &tree);
        self.checkouts.borrow_mut().insert(
            dest.to_path_buf(),
            CheckoutState {
                url: url.to_string(),
                branch: branch.to_string(),
                committed: tree,
            },
        );
        Ok(())
    }

    fn clone_at_commit(&self, url: &str, commit: &str, dest: &Path) -> Result<()> {
        let tree = self
            .snapshots
            .borrow()
            .get(&(url.to_string(), commit.to_string()))
            .cloned()
            .ok_or_else(|| fail(format!("no commit {commit} in {url}")))?;
        write_tree(dest, &tree);
        fs::create_dir_all(dest.join(".git")).unwrap();
        fs::write(dest.join(".git/HEAD"), commit).unwrap();
        Ok(())
    }

    fn has_changes(&self, repo: &Path) -> Result<bool> {
        let checkouts = self.checkouts.borrow();
        let state = checkouts
            .get(repo)
            .ok_or_else(|| fail(format!("{} is not a checkout", repo.display())))?;
        Ok(read_tree(repo) != state.committed)
    }

    fn create_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        let mut checkouts = self.checkouts.borrow_mut();
        let state = checkouts
            .get_mut(repo)
            .ok_or_else(|| fail(format!("{} is not a checkout", repo.display())))?;
        state.branch = branch.to_string();
        drop(checkouts);
        self.record(format!("branch {branch}"));
        Ok(())
    }

    fn commit_all(&self, repo: &Path, message: &str, identity: &GitIdentity) -> Result<()> {
        let mut checkouts = self.checkouts.borrow_mut();
        let state = checkouts
            .get_mut(repo)
            .ok_or_else(|| fail(format!("{} is not a checkout", repo.display())))?;
        state.committed = read_tree(repo);
        drop(checkouts);
        self.record(format!("commit {} <{}>: {message}", identity.name, identity.email));
        Ok(())
    }

    fn push(&self, repo: &Path, branch: &str) -> Result<()> {
        if *self.fail_push.borrow() {
            return Err(fail("push rejected"));
        }
        let checkouts = self.checkouts.borrow();
        let state = checkouts
            .get(repo)
            .ok_or_else(|| fail(format!("{} is not a checkout", repo.display())))?;
        self.branches
            .borrow_mut()
            .insert((state.url.clone(), branch.to_string()), state.committed.clone());
        drop(checkouts);
        self.record(format!("push {branch}"));
        Ok(())
    }

    fn last_commit(&self, repo: &Path) -> Result<Option<CommitInfo>> {
        let checkouts = self.checkouts.borrow();
        let state = checkouts
            .get(repo)
            .ok_or_else(|| fail(format!("{} is not a checkout", repo.display())))?;
        Ok(self
            .commits
            .borrow()
            .get(&(state.url.clone(), state.branch.clone()))
            .cloned())
    }

    fn show_file(&self, repo: &Path, _rev: &str, path: &str) -> Result<Option<Vec<u8>>> {
        if !repo.is_dir() {
            return Err(fail(format!("not a repository: {}", repo.display())));
        }
        match fs::read(repo.join(path)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(fail(e.to_string())),
        }
    }

    fn archive(&self, repo: &Path, _rev: &str, dest: &Path) -> Result<()> {
        crate::archive::zip_directory(repo, dest).map(|_| ())
    }
}

/// Pull-request service that records every request
#[derive(Default)]
pub struct RecordingPullRequests {
    requests: RefCell<Vec<(String, PullRequest)>>,
}

impl RecordingPullRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<(String, PullRequest)> {
        self.requests.borrow().clone()
    }
}

impl PullRequestService for RecordingPullRequests {
    fn create_pull_request(
        &self,
        repository: &str,
        request: &PullRequest,
    ) -> Result<PullRequestInfo> {
        let mut requests = self.requests.borrow_mut();
        requests.push((repository.to_string(), request.clone()));
        Ok(PullRequestInfo {
            number: requests.len() as u64,
            html_url: format!("https://example.invalid/{repository}/pull/{}", requests.len()),
        })
    }
}

/// Fetcher serving prebuilt artifacts from a directory, keyed by strategy
#[derive(Default)]
pub struct DirFetcher {
    artifacts: RefCell<HashMap<FetchStrategy, PathBuf>>,
    fetches: RefCell<Vec<FetchStrategy>>,
}

impl DirFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, strategy: FetchStrategy, artifact: &Path) {
        self.artifacts
            .borrow_mut()
            .insert(strategy, artifact.to_path_buf());
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.borrow().len()
    }
}

impl ArtifactFetcher for DirFetcher {
    fn fetch(&self, strategy: &FetchStrategy, dest: &Path) -> Result<()> {
        self.fetches.borrow_mut().push(strategy.clone());
        let source = self
            .artifacts
            .borrow()
            .get(strategy)
            .cloned()
            .ok_or_else(|| Error::FetchFailed(format!("HTTP 404 for {strategy}")))?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, dest)?;
        Ok(())
    }
}

// src/vcs/git.rs

//! [`VersionControl`] backed by the `git` command line

use crate::config::GitIdentity;
use crate::error::{Error, Result};
use crate::fsutil;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};
use url::Url;

use super::{CommitInfo, VersionControl};

/// Runs git as a child process
#[derive(Debug, Clone)]
pub struct GitCli {
    git: PathBuf,
}

impl GitCli {
    /// Locate `git` on `PATH`
    pub fn new() -> Result<Self> {
        let git = which::which("git")
            .map_err(|e| Error::ConfigError(format!("git executable not found: {e}")))?;
        debug!("Using git at {}", git.display());
        Ok(Self { git })
    }

    fn run<S: AsRef<OsStr>>(&self, repo: Option<&Path>, args: &[S]) -> Result<Output> {
        let shown: Vec<String> = args
            .iter()
            .map(|a| redact(&a.as_ref().to_string_lossy()))
            .collect();
        debug!("git {}", shown.join(" "));

        let mut command = Command::new(&self.git);
        if let Some(repo) = repo {
            command.arg("-C").arg(repo);
        }
        let output = command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .map_err(|e| {
                Error::PublishCollaboratorError(format!("Failed to run git {}: {e}", shown.join(" ")))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::PublishCollaboratorError(format!(
                "git {} failed: {}",
                shown.join(" "),
                redact_text(stderr.trim())
            )));
        }
        Ok(output)
    }

    fn run_stdout<S: AsRef<OsStr>>(&self, repo: &Path, args: &[S]) -> Result<String> {
        let output = self.run(Some(repo), args)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for GitCli {
    fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
        info!("Cloning {} ({}) into {}", redact(url), branch, dest.display());
        self.run(
            None,
            &[
                OsStr::new("clone"),
                OsStr::new("--quiet"),
                OsStr::new("--depth"),
                OsStr::new("1"),
                OsStr::new("--branch"),
                OsStr::new(branch),
                OsStr::new(url),
                dest.as_os_str(),
            ],
        )?;
        Ok(())
    }

    fn clone_at_commit(&self, url: &str, commit: &str, dest: &Path) -> Result<()> {
        info!("Fetching {} at {} into {}", redact(url), commit, dest.display());
        self.run(None, &[OsStr::new("init"), OsStr::new("--quiet"), dest.as_os_str()])?;
        self.run(Some(dest), &["remote", "add", "origin", url])?;
        self.run(Some(dest), &["fetch", "--quiet", "--depth", "1", "origin", commit])?;
        self.run(Some(dest), &["checkout", "--quiet", "--detach", "FETCH_HEAD"])?;
        Ok(())
    }

    fn has_changes(&self, repo: &Path) -> Result<bool> {
        let status = self.run_stdout(repo, &["status", "--porcelain", "--untracked-files=all"])?;
        Ok(!status.trim().is_empty())
    }

    fn create_branch(&self, repo: &Path, branch: &str) -> Result<()> {
        info!("Creating branch {}", branch);
        self.run(Some(repo), &["checkout", "--quiet", "-b", branch])?;
        Ok(())
    }

    fn commit_all(&self, repo: &Path, message: &str, identity: &GitIdentity) -> Result<()> {
        self.run(Some(repo), &["add", "--all"])?;
        let name = format!("user.name={}", identity.name);
        let email = format!("user.email={}", identity.email);
        self.run(
            Some(repo),
            &[
                "-c",
                name.as_str(),
                "-c",
                email.as_str(),
                "-c",
                "commit.gpgsign=false",
                "commit",
                "--quiet",
                "-m",
                message,
            ],
        )?;
        Ok(())
    }

    fn push(&self, repo: &Path, branch: &str) -> Result<()> {
        info!("Pushing branch {}", branch);
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        self.run(Some(repo), &["push", "--quiet", "origin", refspec.as_str()])?;
        Ok(())
    }

    fn last_commit(&self, repo: &Path) -> Result<Option<CommitInfo>> {
        if self.run(Some(repo), &["rev-parse", "--verify", "--quiet", "HEAD"]).is_err() {
            return Ok(None);
        }

        let log = self.run_stdout(repo, &["log", "-1", "--format=%H%n%B"])?;
        let mut lines = log.splitn(2, '\n');
        let sha = lines.next().unwrap_or("").trim().to_string();
        let message = lines.next().unwrap_or("").trim().to_string();

        if sha.is_empty() {
            return Ok(None);
        }
        Ok(Some(CommitInfo { sha, message }))
    }

    fn show_file(&self, repo: &Path, rev: &str, path: &str) -> Result<Option<Vec<u8>>> {
        // An unknown revision is an error; only a missing path maps to None.
        let tree = format!("{rev}^{{tree}}");
        let tree = self.run_stdout(repo, &["rev-parse", "--verify", "--quiet", tree.as_str()])?;
        let tree = tree.trim();
        let listed = self.run_stdout(repo, &["ls-tree", "--name-only", tree, "--", path])?;
        if listed.trim().is_empty() {
            debug!("{} not present at {}", path, rev);
            return Ok(None);
        }
        let object = format!("{tree}:{path}");
        let output = self.run(Some(repo), &["show", object.as_str()])?;
        Ok(Some(output.stdout))
    }

    fn archive(&self, repo: &Path, rev: &str, dest: &Path) -> Result<()> {
        info!("Archiving {} to {}", rev, dest.display());
        let temp = fsutil::temp_file_beside(dest)?;
        // git runs inside `repo`, so relative destinations must be resolved here.
        let target = std::path::absolute(temp.path())?;
        self.run(
            Some(repo),
            &[
                OsStr::new("archive"),
                OsStr::new("--format=zip"),
                OsStr::new("-o"),
                target.as_os_str(),
                OsStr::new(rev),
            ],
        )?;
        fsutil::persist(temp, dest)
    }
}

/// Strip credentials from a URL argument
fn redact(arg: &str) -> String {
    match Url::parse(arg) {
        Ok(mut url) if url.password().is_some() || !url.username().is_empty() => {
            let _ = url.set_password(None);
            let _ = url.set_username("");
            url.to_string()
        }
        _ => arg.to_string(),
    }
}

/// Strip credentials from URLs embedded in free text
fn redact_text(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let url = word.trim_matches(|c| c == '\'' || c == '"');
            if url.contains("://") {
                word.replace(url, &redact(url))
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

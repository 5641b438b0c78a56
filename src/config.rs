// src/config.rs

//! Run configuration
//!
//! Everything a run needs from its environment (hosting credentials, the
//! commit identity, service endpoints, the work directory) is collected
//! once into a [`Config`] and passed explicitly to the collaborators that
//! need it. Missing values fail with `ConfigError` before any I/O happens.

use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::debug;
use url::Url;

/// Environment variable holding the hosting-service user
pub const ENV_GITHUB_USER: &str = "GITHUB_USER";
/// Environment variable holding the hosting-service token
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Environment variable holding the commit author name
pub const ENV_GIT_USER_NAME: &str = "GIT_USER_NAME";
/// Environment variable holding the commit author email
pub const ENV_GIT_USER_EMAIL: &str = "GIT_USER_EMAIL";
/// Platform version used when none is given on the command line
pub const ENV_PLATFORM: &str = "KODI_VERSION";
/// Fallback platform version
pub const ENV_DEFAULT_PLATFORM: &str = "DEFAULT_KODI_VERSION";

const ENV_GITHUB_API: &str = "ADDONREPO_GITHUB_API";
const ENV_DOWNLOAD_BASE: &str = "ADDONREPO_DOWNLOAD_BASE";
const ENV_GIT_HOST: &str = "ADDONREPO_GIT_HOST";

const DEFAULT_GITHUB_API: &str = "https://api.github.com/";
const DEFAULT_DOWNLOAD_BASE: &str = "https://github.com/";
const DEFAULT_GIT_HOST: &str = "https://github.com/";

/// Credentials for pushing and opening pull requests
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub token: String,
}

/// Author identity recorded on commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
    pub name: String,
    pub email: String,
}

/// Service endpoints, overridable for mirrors and tests
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// REST API root used for pull requests
    pub github_api: Url,
    /// Root of release download URLs
    pub download_base: Url,
    /// Root of clone URLs
    pub git_host: Url,
}

/// Complete configuration for one run
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub identity: GitIdentity,
    pub endpoints: Endpoints,
    /// Directory holding temporary clones and the run lock
    pub work_dir: PathBuf,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// A `.env` file in the current directory is honored if present.
    pub fn from_env(work_dir: PathBuf) -> Result<Self> {
        load_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(work_dir, |key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(work_dir: PathBuf, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let identity = GitIdentity {
            name: required_var(&lookup, ENV_GIT_USER_NAME, "for new commits")?,
            email: required_var(&lookup, ENV_GIT_USER_EMAIL, "for new commits")?,
        };
        let credentials = Credentials {
            user: required_var(
                &lookup,
                ENV_GITHUB_USER,
                "for pushing and creating pull requests",
            )?,
            token: required_var(
                &lookup,
                ENV_GITHUB_TOKEN,
                "for pushing and creating pull requests",
            )?,
        };

        let endpoints = Endpoints {
            github_api: endpoint(&lookup, ENV_GITHUB_API, DEFAULT_GITHUB_API)?,
            download_base: endpoint(&lookup, ENV_DOWNLOAD_BASE, DEFAULT_DOWNLOAD_BASE)?,
            git_host: endpoint(&lookup, ENV_GIT_HOST, DEFAULT_GIT_HOST)?,
        };

        Ok(Self {
            credentials,
            identity,
            endpoints,
            work_dir,
        })
    }

    /// Authenticated clone URL for `owner/name`
    pub fn clone_url(&self, repository: &str) -> Result<String> {
        let mut url = self.repository_url(repository)?;
        // Hosts without an authority (file:// mirrors) take no credentials.
        if url.set_username(&self.credentials.user).is_ok() {
            let _ = url.set_password(Some(&self.credentials.token));
        }
        Ok(url.to_string())
    }

    /// Clone URL for `owner/name` without credentials, safe to log
    pub fn display_url(&self, repository: &str) -> String {
        self.repository_url(repository)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| repository.to_string())
    }

    /// Download URL of a release asset
    pub fn release_url(&self, repository: &str, release_tag: &str, filename: &str) -> Result<String> {
        self.endpoints
            .download_base
            .join(&format!("{repository}/releases/download/{release_tag}/{filename}"))
            .map(|u| u.to_string())
            .map_err(|e| Error::ConfigError(format!("Invalid release URL for {repository}: {e}")))
    }

    fn repository_url(&self, repository: &str) -> Result<Url> {
        self.endpoints
            .git_host
            .join(&format!("{repository}.git"))
            .map_err(|e| Error::ConfigError(format!("Invalid repository '{repository}': {e}")))
    }
}

/// Resolve the platform version from the command line or the environment
///
/// The result is trimmed and lowercased, and must not be empty.
pub fn resolve_platform<F>(explicit: Option<&str>, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let candidate = explicit
        .map(str::to_string)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| lookup(ENV_PLATFORM).filter(|v| !v.trim().is_empty()))
        .or_else(|| lookup(ENV_DEFAULT_PLATFORM))
        .unwrap_or_default();

    let platform = normalize_platform(&candidate);
    if platform.is_empty() {
        return Err(Error::ConfigError(format!(
            "Missing platform version, use -k or set {ENV_PLATFORM}"
        )));
    }
    Ok(platform)
}

/// Canonical form of a platform version key
pub fn normalize_platform(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn required_var<F>(lookup: &F, key: &str, purpose: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| Error::ConfigError(format!("Missing ENV {key} {purpose}")))
}

fn endpoint<F>(lookup: &F, key: &str, default: &str) -> Result<Url>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    let raw = if raw.ends_with('/') {
        raw
    } else {
        format!("{raw}/")
    };
    Url::parse(&raw).map_err(|e| Error::ConfigError(format!("Invalid {key} '{raw}': {e}")))
}

/// A missing `.env` is fine; an unreadable or malformed one is not
fn load_dotenv(loaded: std::result::Result<PathBuf, dotenvy::Error>) -> Result<()> {
    match loaded {
        Ok(path) => {
            debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(Error::ConfigError(format!("Failed to load .env: {e}"))),
    }
}

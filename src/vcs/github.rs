// src/vcs/github.rs

//! Pull-request creation on GitHub

use crate::config::Config;
use crate::error::{Error, Result};
use crate::repository::USER_AGENT;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use url::Url;

const API_TIMEOUT: Duration = Duration::from_secs(30);

/// A pull request to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    /// Branch carrying the changes
    pub head: String,
    /// Branch the changes should be merged into
    pub base: String,
}

/// The pull request as created by the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    pub html_url: String,
}

/// Opens pull requests on a hosting service
pub trait PullRequestService {
    /// Open `request` against `repository` (`owner/name`)
    fn create_pull_request(&self, repository: &str, request: &PullRequest)
        -> Result<PullRequestInfo>;
}

/// GitHub REST API client
pub struct GitHubClient {
    client: Client,
    api_base: Url,
    token: String,
}

impl GitHubClient {
    /// Create a client for the configured API endpoint and token
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(API_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.endpoints.github_api.clone(),
            token: config.credentials.token.clone(),
        })
    }

    fn pulls_url(&self, repository: &str) -> Result<Url> {
        self.api_base
            .join(&format!("repos/{repository}/pulls"))
            .map_err(|e| Error::ConfigError(format!("Invalid repository '{repository}': {e}")))
    }
}

impl PullRequestService for GitHubClient {
    fn create_pull_request(
        &self,
        repository: &str,
        request: &PullRequest,
    ) -> Result<PullRequestInfo> {
        let url = self.pulls_url(repository)?;
        info!(
            "Creating pull request {} -> {} in {}",
            request.head, request.base, repository
        );

        let response = self
            .client
            .post(url)
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .map_err(|e| {
                Error::PublishCollaboratorError(format!("Failed to create pull request: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(Error::PublishCollaboratorError(format!(
                "GitHub API error {status} creating pull request in {repository}: {}",
                api_message(&detail)
            )));
        }

        let created: PullRequestInfo = response.json().map_err(|e| {
            Error::PublishCollaboratorError(format!("Invalid pull request response: {e}"))
        })?;
        info!("Created pull request #{} ({})", created.number, created.html_url);
        Ok(created)
    }
}

/// The `message` of a GitHub error payload, or the raw body
fn api_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

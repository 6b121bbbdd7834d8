//! GitHub pull request fetcher.
//!
//! Parses pull request URLs, fetches PR metadata and the per-file patch
//! listing from the GitHub REST API, and maps them into [`PrContent`].
//! The token is optional: public repositories work anonymously, within
//! GitHub's unauthenticated rate limits.

pub mod cache;
pub mod format;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::models::pr::DESCRIPTION_PLACEHOLDER;
use crate::models::{FileStatus, PrContent, PrSummaryFile};

pub use cache::PrFetcher;

/// Files requested per page of the file listing (GitHub's maximum).
const FILES_PER_PAGE: usize = 100;

/// GitHub stops listing files after 3000, i.e. 30 full pages.
const MAX_FILE_PAGES: usize = 30;

/// Errors from the PR fetcher.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "invalid pull request URL '{url}': expected https://<host>/<owner>/<repo>/pull/<number>"
    )]
    InvalidUrl { url: String },

    #[error("GitHub API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// A parsed `https://<host>/<owner>/<repo>/pull/<number>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrUrl {
    pub url: String,
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PrUrl {
    /// Parse a pull request URL.
    ///
    /// Only `https` links are accepted. Trailing segments after the number
    /// (`/files`, `/commits`) are accepted so links copied from any PR tab
    /// work.
    pub fn parse(raw: &str) -> Result<Self, GitHubError> {
        let raw = raw.trim();
        let invalid = || GitHubError::InvalidUrl {
            url: raw.to_string(),
        };

        let parsed = url::Url::parse(raw).map_err(|_| invalid())?;
        if parsed.scheme() != "https" || parsed.host_str().is_none() {
            return Err(invalid());
        }

        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        if segments.len() < 4 || segments[2] != "pull" {
            return Err(invalid());
        }
        let number = segments[3].parse::<u64>().map_err(|_| invalid())?;

        Ok(Self {
            url: raw.to_string(),
            owner: segments[0].to_string(),
            repo: segments[1].to_string(),
            number,
        })
    }
}

/// `GET /repos/{owner}/{repo}/pulls/{number}` response (fields used).
#[derive(Debug, Deserialize)]
struct PullResponse {
    title: String,
    #[serde(default)]
    body: Option<String>,
    user: UserResponse,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    changed_files: u64,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{number}/files`.
#[derive(Debug, Deserialize)]
struct FileResponse {
    filename: String,
    status: String,
    #[serde(default)]
    additions: u64,
    #[serde(default)]
    deletions: u64,
    #[serde(default)]
    patch: Option<String>,
    #[serde(default)]
    previous_filename: Option<String>,
}

impl From<FileResponse> for PrSummaryFile {
    fn from(f: FileResponse) -> Self {
        Self {
            name: f.filename,
            status: FileStatus::from_github(&f.status),
            additions: f.additions,
            deletions: f.deletions,
            patch: f.patch,
            previous_name: f.previous_filename,
        }
    }
}

/// Client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
}

impl GitHubClient {
    /// Create a client against the given API base URL
    /// (`https://api.github.com`, or a GitHub Enterprise `/api/v3` root).
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a pull request's metadata and changed files.
    ///
    /// The `Authorization` header is attached only when `token` is a
    /// non-empty string.
    pub async fn fetch_pr(&self, pr: &PrUrl, token: Option<&str>) -> Result<PrContent, GitHubError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty());
        let base = format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_url, pr.owner, pr.repo, pr.number
        );

        let pull: PullResponse = self.get_json(&base, token).await?;

        let mut files = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let url = format!("{base}/files?per_page={FILES_PER_PAGE}&page={page}");
            let batch: Vec<FileResponse> = self.get_json(&url, token).await?;
            let full_page = batch.len() == FILES_PER_PAGE;
            files.extend(batch.into_iter().map(PrSummaryFile::from));
            if !full_page {
                break;
            }
        }

        debug!(
            owner = %pr.owner,
            repo = %pr.repo,
            number = pr.number,
            files = files.len(),
            "fetched pull request"
        );

        let description = pull
            .body
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string());

        Ok(PrContent {
            url: pr.url.clone(),
            title: pull.title,
            description,
            author: pull.user.login,
            additions: pull.additions,
            deletions: pull.deletions,
            changed_files: pull.changed_files,
            files,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: Option<&str>,
    ) -> Result<T, GitHubError> {
        let mut request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header(
                "User-Agent",
                format!("{}/{}", crate::constants::APP_NAME, crate::constants::VERSION),
            );
        if let Some(token) = token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(GitHubError::Api { status, body });
        }

        Ok(response.json::<T>().await?)
    }
}

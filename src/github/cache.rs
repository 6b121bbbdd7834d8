//! Per-URL cache in front of [`GitHubClient`].
//!
//! The client keeps one PR URL "field". Submitting again with the same URL
//! reuses the fetched content; editing the field drops it.

use tracing::debug;

use crate::models::PrContent;

use super::{GitHubClient, GitHubError, PrUrl};

/// Fetches a pull request at most once per URL.
#[derive(Debug)]
pub struct PrFetcher {
    client: GitHubClient,
    url: Option<String>,
    cached: Option<PrContent>,
}

impl PrFetcher {
    pub fn new(client: GitHubClient) -> Self {
        Self {
            client,
            url: None,
            cached: None,
        }
    }

    /// The current PR URL, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Edit the PR URL field. A blank value clears it.
    ///
    /// Any change invalidates the cached content; setting the same URL
    /// again keeps it.
    pub fn set_url(&mut self, url: &str) {
        let url = url.trim();
        let next = (!url.is_empty()).then(|| url.to_string());
        if next != self.url {
            self.url = next;
            self.cached = None;
        }
    }

    /// The cached content for the current URL, if fetched.
    pub fn cached(&self) -> Option<&PrContent> {
        self.cached.as_ref()
    }

    /// Fetch the current PR, reusing the cache when the URL is unchanged.
    ///
    /// Returns `Ok(None)` when no URL is set. An invalid URL fails before
    /// any request is made.
    pub async fn fetch(&mut self, token: Option<&str>) -> Result<Option<PrContent>, GitHubError> {
        let Some(url) = self.url.clone() else {
            return Ok(None);
        };
        if let Some(ref cached) = self.cached {
            debug!(%url, "pull request cache hit");
            return Ok(Some(cached.clone()));
        }

        let pr = PrUrl::parse(&url)?;
        let content = self.client.fetch_pr(&pr, token).await?;
        self.cached = Some(content.clone());
        Ok(Some(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> PrFetcher {
        // Unroutable: these tests must never reach the network.
        PrFetcher::new(GitHubClient::new("http://127.0.0.1:9"))
    }

    #[tokio::test]
    async fn no_url_fetches_nothing() {
        let mut f = fetcher();
        assert!(f.fetch(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_url_fails_before_network() {
        let mut f = fetcher();
        f.set_url("https://github.com/o/r/tree/main");
        let err = f.fetch(None).await.unwrap_err();
        assert!(matches!(err, GitHubError::InvalidUrl { .. }));
    }

    #[test]
    fn blank_url_clears_field() {
        let mut f = fetcher();
        f.set_url("https://github.com/o/r/pull/1");
        f.set_url("   ");
        assert_eq!(f.url(), None);
    }

    #[test]
    fn editing_url_drops_cache() {
        let mut f = fetcher();
        f.set_url("https://github.com/o/r/pull/1");
        f.cached = Some(PrContent {
            url: "https://github.com/o/r/pull/1".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            author: "a".to_string(),
            additions: 0,
            deletions: 0,
            changed_files: 0,
            files: vec![],
        });

        f.set_url(" https://github.com/o/r/pull/1 ");
        assert!(f.cached().is_some(), "same URL keeps the cache");

        f.set_url("https://github.com/o/r/pull/2");
        assert!(f.cached().is_none(), "a different URL invalidates");
    }
}

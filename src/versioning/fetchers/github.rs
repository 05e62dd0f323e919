//! GitHub Releases fetcher.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::{filter_and_sort, normalize_repo, registry_client, FetchError, TagFetcher};
use crate::db::enums::VersionSource;
use crate::version::VERSION;

pub struct GithubReleaseFetcher {
    client: Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Release {
    tag_name: String,
    prerelease: bool,
}

impl GithubReleaseFetcher {
    pub fn new(token: Option<String>) -> Self {
        Self {
            // GitHub's API rejects requests without a User-Agent.
            client: registry_client(&format!("homedash/{VERSION}")),
            token,
        }
    }

    async fn try_fetch(&self, repo: &str) -> Result<Vec<String>, FetchError> {
        let path = normalize_repo(repo, &["github.com/"]);
        // Cap at the 50 most recent releases.
        let url = format!("https://api.github.com/repos/{path}/releases?per_page=50");

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let releases: Vec<Release> = response.json().await?;
        Ok(tags_from_releases(releases))
    }
}

fn tags_from_releases(releases: Vec<Release>) -> Vec<String> {
    filter_and_sort(
        releases
            .into_iter()
            .filter(|r| !r.prerelease)
            .map(|r| r.tag_name),
        false,
    )
}

#[async_trait]
impl TagFetcher for GithubReleaseFetcher {
    fn source(&self) -> VersionSource {
        VersionSource::GithubReleases
    }

    async fn fetch_tags(&self, repo: &str) -> Vec<String> {
        match self.try_fetch(repo).await {
            Ok(tags) => {
                debug!(repo = %repo, count = tags.len(), "Fetched GitHub release tags.");
                tags
            }
            Err(e) => {
                error!(repo = %repo, error = %e, "GitHub release fetch failed.");
                Vec::new()
            }
        }
    }
}

//! Docker Hub fetcher.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::{filter_and_sort, normalize_repo, registry_client, FetchError, TagFetcher};
use crate::db::enums::VersionSource;

/// Docker Hub blocks default HTTP client User-Agents, so the request has to
/// look like a browser.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub struct DockerHubFetcher {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TagPage {
    #[serde(default)]
    results: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Official images live under the implicit `library` namespace.
fn qualify_repo_path(path: &str) -> String {
    if path.contains('/') {
        path.to_string()
    } else {
        format!("library/{path}")
    }
}

impl Default for DockerHubFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerHubFetcher {
    pub fn new() -> Self {
        Self {
            client: registry_client(BROWSER_USER_AGENT),
        }
    }

    async fn try_fetch(&self, repo: &str) -> Result<Vec<String>, FetchError> {
        let path = qualify_repo_path(&normalize_repo(
            repo,
            &["hub.docker.com/r/", "docker.io/"],
        ));
        // Single page; 100 tags is plenty to find the newest semver.
        let url = format!("https://hub.docker.com/v2/repositories/{path}/tags?page_size=100");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let page: TagPage = response.json().await?;
        Ok(tags_from_page(page))
    }
}

fn tags_from_page(page: TagPage) -> Vec<String> {
    filter_and_sort(page.results.into_iter().map(|t| t.name), true)
}

#[async_trait]
impl TagFetcher for DockerHubFetcher {
    fn source(&self) -> VersionSource {
        VersionSource::DockerHub
    }

    async fn fetch_tags(&self, repo: &str) -> Vec<String> {
        match self.try_fetch(repo).await {
            Ok(tags) => {
                debug!(repo = %repo, count = tags.len(), "Fetched Docker Hub tags.");
                tags
            }
            Err(e) => {
                error!(repo = %repo, error = %e, "Docker Hub tag fetch failed.");
                Vec::new()
            }
        }
    }
}

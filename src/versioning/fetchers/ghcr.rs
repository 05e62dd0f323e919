//! GitHub Container Registry fetcher.
//!
//! Uses the GitHub packages API, which requires a token even for public
//! images. Tags are aggregated across all package versions and deduped.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::{filter_and_sort, normalize_repo, registry_client, FetchError, TagFetcher};
use crate::db::enums::VersionSource;
use crate::version::VERSION;

pub struct GhcrFetcher {
    client: Client,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PackageVersion {
    metadata: PackageMetadata,
}

#[derive(Debug, Deserialize)]
struct PackageMetadata {
    container: ContainerMetadata,
}

#[derive(Debug, Deserialize)]
struct ContainerMetadata {
    #[serde(default)]
    tags: Vec<String>,
}

/// Splits a normalized GHCR path into `(owner, package)`. The package segment
/// of an `owner/repo/image` path is slash-encoded for the packages API.
fn split_package_path(path: &str) -> Result<(String, String), FetchError> {
    let parts: Vec<&str> = path.split('/').collect();
    match parts.as_slice() {
        [owner, image] => Ok((owner.to_string(), image.to_string())),
        [owner, repo, image] => Ok((owner.to_string(), format!("{repo}%2F{image}"))),
        _ => Err(FetchError::InvalidRepoPath(path.to_string())),
    }
}

impl GhcrFetcher {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: registry_client(&format!("homedash/{VERSION}")),
            token,
        }
    }

    async fn try_fetch(&self, repo: &str) -> Result<Vec<String>, FetchError> {
        let path = normalize_repo(repo, &["ghcr.io/", "github.com/"]);
        let (owner, package) = split_package_path(&path)?;
        let token = self.token.as_ref().ok_or(FetchError::MissingToken)?;

        let url = format!(
            "https://api.github.com/users/{owner}/packages/container/{package}/versions?per_page=100"
        );
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let versions: Vec<PackageVersion> = response.json().await?;
        Ok(tags_from_versions(versions))
    }
}

fn tags_from_versions(versions: Vec<PackageVersion>) -> Vec<String> {
    let unique: HashSet<String> = versions
        .into_iter()
        .flat_map(|v| v.metadata.container.tags)
        .collect();
    filter_and_sort(unique, true)
}

#[async_trait]
impl TagFetcher for GhcrFetcher {
    fn source(&self) -> VersionSource {
        VersionSource::Ghcr
    }

    async fn fetch_tags(&self, repo: &str) -> Vec<String> {
        match self.try_fetch(repo).await {
            Ok(tags) => {
                debug!(repo = %repo, count = tags.len(), "Fetched GHCR tags.");
                tags
            }
            Err(e) => {
                error!(repo = %repo, error = %e, "GHCR tag fetch failed.");
                Vec::new()
            }
        }
    }
}

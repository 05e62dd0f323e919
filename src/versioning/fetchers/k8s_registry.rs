//! Kubernetes community registry (registry.k8s.io) fetcher.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use super::{filter_and_sort, normalize_repo, registry_client, FetchError, TagFetcher};
use crate::db::enums::VersionSource;
use crate::version::VERSION;

pub struct K8sRegistryFetcher {
    client: Client,
}

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Vec<String>,
}

impl Default for K8sRegistryFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl K8sRegistryFetcher {
    pub fn new() -> Self {
        Self {
            client: registry_client(&format!("homedash/{VERSION}")),
        }
    }

    async fn try_fetch(&self, repo: &str) -> Result<Vec<String>, FetchError> {
        let path = normalize_repo(repo, &["registry.k8s.io/"]);
        // Standard OCI distribution endpoint; no auth required on this host.
        let url = format!("https://registry.k8s.io/v2/{path}/tags/list");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let list: TagList = response.json().await?;
        Ok(filter_and_sort(list.tags, true))
    }
}

#[async_trait]
impl TagFetcher for K8sRegistryFetcher {
    fn source(&self) -> VersionSource {
        VersionSource::K8sRegistry
    }

    async fn fetch_tags(&self, repo: &str) -> Vec<String> {
        match self.try_fetch(repo).await {
            Ok(tags) => {
                debug!(repo = %repo, count = tags.len(), "Fetched registry.k8s.io tags.");
                tags
            }
            Err(e) => {
                error!(repo = %repo, error = %e, "registry.k8s.io tag fetch failed.");
                Vec::new()
            }
        }
    }
}

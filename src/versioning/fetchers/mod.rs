//! Registry tag fetchers.
//!
//! Each fetcher queries one external registry API and returns semver-filtered
//! tags, newest first, with `latest` excluded. Fetchers are fail-soft: any
//! network, auth or parse failure is logged and yields an empty list so a
//! broken registry never aborts an update-check batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::db::enums::VersionSource;
use crate::versioning::comparator::{is_semver, is_strict_semver, sort_newest_first};

pub mod docker_hub;
pub mod ghcr;
pub mod github;
pub mod k8s_registry;

pub use docker_hub::DockerHubFetcher;
pub use ghcr::GhcrFetcher;
pub use github::GithubReleaseFetcher;
pub use k8s_registry::K8sRegistryFetcher;

/// Registry fetches have no natural cancellation point, so the shared client
/// carries a hard timeout to avoid unbounded hangs.
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("registry returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("GITHUB_TOKEN is required for the GHCR package API")]
    MissingToken,
    #[error("invalid repository path: {0}")]
    InvalidRepoPath(String),
}

/// One registry's tag listing API.
#[async_trait]
pub trait TagFetcher: Send + Sync {
    fn source(&self) -> VersionSource;

    /// Semver-filtered tags, newest first. Empty on any failure.
    async fn fetch_tags(&self, repo: &str) -> Vec<String>;

    /// The newest available tag, or `None` when the registry has none or the
    /// fetch failed.
    async fn latest_tag(&self, repo: &str) -> Option<String> {
        self.fetch_tags(repo).await.into_iter().next()
    }
}

/// Builds the production fetcher set, keyed by source type.
pub fn default_fetchers(config: &ServerConfig) -> HashMap<VersionSource, Arc<dyn TagFetcher>> {
    let mut fetchers: HashMap<VersionSource, Arc<dyn TagFetcher>> = HashMap::new();
    fetchers.insert(
        VersionSource::GithubReleases,
        Arc::new(GithubReleaseFetcher::new(config.github_token.clone())),
    );
    fetchers.insert(
        VersionSource::Ghcr,
        Arc::new(GhcrFetcher::new(config.github_token.clone())),
    );
    fetchers.insert(VersionSource::DockerHub, Arc::new(DockerHubFetcher::new()));
    fetchers.insert(
        VersionSource::K8sRegistry,
        Arc::new(K8sRegistryFetcher::new()),
    );
    fetchers
}

pub(crate) fn registry_client(user_agent: &str) -> Client {
    Client::builder()
        .user_agent(user_agent)
        .timeout(FETCH_TIMEOUT)
        .build()
        .unwrap() // Should not fail with default settings
}

/// Strips protocol, source-specific prefixes, a `.git` suffix and a trailing
/// slash from a configured repository/image path.
pub(crate) fn normalize_repo(repo: &str, prefixes: &[&str]) -> String {
    let mut path = repo.trim();
    path = path.strip_prefix("https://").unwrap_or(path);
    path = path.strip_prefix("http://").unwrap_or(path);
    for prefix in prefixes {
        path = path.strip_prefix(prefix).unwrap_or(path);
    }
    path = path.strip_suffix(".git").unwrap_or(path);
    path = path.strip_suffix('/').unwrap_or(path);
    path.to_string()
}

/// Drops non-semver tags (and `latest`) and sorts newest first.
pub(crate) fn filter_and_sort<I>(tags: I, strict: bool) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut tags: Vec<String> = tags
        .into_iter()
        .filter(|t| t != "latest")
        .filter(|t| if strict { is_strict_semver(t) } else { is_semver(t) })
        .collect();
    sort_newest_first(&mut tags);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_protocol_prefix_git_suffix_and_slash() {
        assert_eq!(
            normalize_repo("https://github.com/acme/app.git", &["github.com/"]),
            "acme/app"
        );
        assert_eq!(
            normalize_repo("ghcr.io/acme/app/", &["ghcr.io/", "github.com/"]),
            "acme/app"
        );
        assert_eq!(normalize_repo("acme/app", &["github.com/"]), "acme/app");
    }

    #[test]
    fn filter_and_sort_excludes_latest_and_orders_descending() {
        let tags = vec![
            "latest".to_string(),
            "1.2.0".to_string(),
            "main".to_string(),
            "v1.10.0".to_string(),
            "sha-abc123".to_string(),
        ];
        let filtered = filter_and_sort(tags, false);
        assert_eq!(filtered, vec!["v1.10.0".to_string(), "1.2.0".to_string()]);
    }

    #[test]
    fn strict_filtering_drops_prerelease_tags() {
        let tags = vec![
            "1.0.0".to_string(),
            "2.0.0-rc.1".to_string(),
            "1.1.0".to_string(),
        ];
        let filtered = filter_and_sort(tags, true);
        assert_eq!(filtered, vec!["1.1.0".to_string(), "1.0.0".to_string()]);
    }
}

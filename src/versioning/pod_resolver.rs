//! Resolves the running version of an app by inspecting live pod images.

use std::sync::Arc;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{api::ListParams, Api, Client};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum PodListError {
    #[error("kubernetes api error: {0}")]
    Api(String),
}

/// The cluster collaborator: container images of all pods in a namespace, in
/// pod/container API order.
#[async_trait]
pub trait PodLister: Send + Sync {
    async fn list_container_images(&self, namespace: &str) -> Result<Vec<String>, PodListError>;
}

/// Production lister backed by the in-cluster (or kubeconfig) client.
pub struct KubePodLister {
    client: Client,
}

impl KubePodLister {
    pub async fn try_default() -> Result<Self, PodListError> {
        let client = Client::try_default()
            .await
            .map_err(|e| PodListError::Api(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PodLister for KubePodLister {
    async fn list_container_images(&self, namespace: &str) -> Result<Vec<String>, PodListError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let pod_list = pods
            .list(&ListParams::default())
            .await
            .map_err(|e| PodListError::Api(e.to_string()))?;

        let mut images = Vec::new();
        for pod in pod_list.items {
            if let Some(spec) = pod.spec {
                for container in spec.containers {
                    if let Some(image) = container.image {
                        images.push(image);
                    }
                }
            }
        }
        Ok(images)
    }
}

/// Splits an image reference on the last `:` into (name, tag); the tag
/// defaults to `latest` when absent.
fn split_image(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((name, tag)) => (name, tag),
        None => (image, "latest"),
    }
}

fn final_segment(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Match rule: names are equal, or either name ends with the other's final
/// path segment. The suffix rule absorbs registry-prefix differences
/// (`ghcr.io/acme/app` vs `acme/app`).
fn image_names_match(a: &str, b: &str) -> bool {
    a == b || a.ends_with(final_segment(b)) || b.ends_with(final_segment(a))
}

pub struct PodVersionResolver {
    lister: Arc<dyn PodLister>,
}

impl PodVersionResolver {
    pub fn new(lister: Arc<dyn PodLister>) -> Self {
        Self { lister }
    }

    /// The tag of the first container whose image matches `docker_image`, in
    /// API list order. First match wins; ties between pods running different
    /// tags of the same image are not resolved in any particular way.
    /// Fail-soft: cluster errors are logged and yield `None`.
    pub async fn version_from_pod(&self, docker_image: &str, namespace: &str) -> Option<String> {
        let images = match self.lister.list_container_images(namespace).await {
            Ok(images) => images,
            Err(e) => {
                error!(namespace = %namespace, error = %e, "Pod listing failed.");
                return None;
            }
        };

        let (target_name, _) = split_image(docker_image);
        for image in &images {
            let (name, tag) = split_image(image);
            if image_names_match(name, target_name) {
                debug!(image = %image, target = %docker_image, "Matched running pod image.");
                return Some(tag.to_string());
            }
        }

        debug!(target = %docker_image, namespace = %namespace, "No running pod matched.");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticLister {
        images: Vec<String>,
    }

    #[async_trait]
    impl PodLister for StaticLister {
        async fn list_container_images(&self, _namespace: &str) -> Result<Vec<String>, PodListError> {
            Ok(self.images.clone())
        }
    }

    struct FailingLister;

    #[async_trait]
    impl PodLister for FailingLister {
        async fn list_container_images(&self, _namespace: &str) -> Result<Vec<String>, PodListError> {
            Err(PodListError::Api("connection refused".to_string()))
        }
    }

    fn resolver(images: &[&str]) -> PodVersionResolver {
        PodVersionResolver::new(Arc::new(StaticLister {
            images: images.iter().map(|s| s.to_string()).collect(),
        }))
    }

    #[tokio::test]
    async fn registry_prefix_differences_still_match() {
        let resolver = resolver(&["ghcr.io/acme/app:v1.2.0"]);
        let version = resolver.version_from_pod("acme/app:v1.0.0", "default").await;
        assert_eq!(version, Some("v1.2.0".to_string()));
    }

    #[tokio::test]
    async fn no_matching_container_yields_none() {
        let resolver = resolver(&["ghcr.io/other/thing:v3.0.0"]);
        assert_eq!(resolver.version_from_pod("acme/app", "default").await, None);
    }

    #[tokio::test]
    async fn missing_tag_defaults_to_latest() {
        let resolver = resolver(&["acme/app"]);
        let version = resolver.version_from_pod("acme/app", "default").await;
        assert_eq!(version, Some("latest".to_string()));
    }

    #[tokio::test]
    async fn first_match_wins_in_api_order() {
        let resolver = resolver(&["acme/app:v1.0.0", "acme/app:v2.0.0"]);
        let version = resolver.version_from_pod("acme/app", "default").await;
        assert_eq!(version, Some("v1.0.0".to_string()));
    }

    #[tokio::test]
    async fn cluster_errors_fail_soft_to_none() {
        let resolver = PodVersionResolver::new(Arc::new(FailingLister));
        assert_eq!(resolver.version_from_pod("acme/app", "default").await, None);
    }

    #[tokio::test]
    async fn empty_namespace_yields_none() {
        let resolver = resolver(&[]);
        assert_eq!(resolver.version_from_pod("acme/app", "default").await, None);
    }
}

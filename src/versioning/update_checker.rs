//! Update detection for tracked apps.
//!
//! Per app: resolve the running version from the cluster when pod tracking is
//! configured, fetch the newest registry tag through the source-selected
//! fetcher, derive `has_update` and persist it, then dispatch an update
//! notification when the flag newly becomes true.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::db::entities::tracked_app;
use crate::db::enums::VersionSource;
use crate::db::store::{AppStore, StoreError};
use crate::notifications::{NotificationEvent, Notifier};
use crate::versioning::comparator::compare_versions;
use crate::versioning::fetchers::TagFetcher;
use crate::versioning::pod_resolver::PodVersionResolver;

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("app {0} not found")]
    AppNotFound(i32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Aggregate result of one `check_all` batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub checked: usize,
    pub updates: usize,
    pub errors: usize,
}

pub struct UpdateChecker {
    store: Arc<dyn AppStore>,
    fetchers: HashMap<VersionSource, Arc<dyn TagFetcher>>,
    pod_resolver: Option<Arc<PodVersionResolver>>,
    notifier: Arc<dyn Notifier>,
}

impl UpdateChecker {
    pub fn new(
        store: Arc<dyn AppStore>,
        fetchers: HashMap<VersionSource, Arc<dyn TagFetcher>>,
        pod_resolver: Option<Arc<PodVersionResolver>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            fetchers,
            pod_resolver,
            notifier,
        }
    }

    /// Checks every tracked app. Per-app failures are logged and counted,
    /// never aborting the batch.
    pub async fn check_all(&self) -> CheckSummary {
        let apps = match self.store.get_all_apps().await {
            Ok(apps) => apps,
            Err(e) => {
                error!(error = %e, "Failed to load apps for update check.");
                return CheckSummary::default();
            }
        };

        let mut summary = CheckSummary::default();
        for app in apps {
            summary.checked += 1;
            match self.check_app(&app).await {
                Ok(true) => summary.updates += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.errors += 1;
                    error!(app = %app.name, error = %e, "Update check failed.");
                }
            }
        }

        info!(
            checked = summary.checked,
            updates = summary.updates,
            errors = summary.errors,
            "Update check batch finished."
        );
        summary
    }

    /// Checks a single app by id. Unlike the batch form, errors propagate to
    /// the caller.
    pub async fn check_one(&self, app_id: i32) -> Result<bool, UpdateError> {
        let app = self
            .store
            .get_app(app_id)
            .await?
            .ok_or(UpdateError::AppNotFound(app_id))?;
        self.check_app(&app).await
    }

    /// Full per-app check. Returns whether the app now has an update pending.
    pub async fn check_app(&self, app: &tracked_app::Model) -> Result<bool, UpdateError> {
        if !app.version_checking_enabled {
            debug!(app = %app.name, "Version checking disabled; skipping.");
            return Ok(false);
        }

        // The running version is persisted even when the registry lookup
        // below fails or is unconfigured.
        let current = match self.resolve_running_version(app).await {
            Some(version) => {
                if app.current_version.as_deref() != Some(version.as_str()) {
                    self.store
                        .set_current_version(app.id, Some(version.clone()))
                        .await?;
                    info!(app = %app.name, version = %version, "Running version updated from pod.");
                }
                Some(version)
            }
            None => app.current_version.clone(),
        };

        let (Some(source), Some(repo)) = (app.source_type, app.source_repo.as_deref()) else {
            debug!(app = %app.name, "No version source configured; skipping.");
            return Ok(false);
        };

        // GitHub Releases doubles as the fallback for sources with no
        // registered fetcher.
        let fetcher = match self
            .fetchers
            .get(&source)
            .or_else(|| self.fetchers.get(&VersionSource::GithubReleases))
        {
            Some(fetcher) => fetcher,
            None => {
                warn!(app = %app.name, source = %source, "No fetcher registered for source.");
                return Ok(false);
            }
        };

        let latest = fetcher.latest_tag(repo).await;

        let has_update = match (&latest, &current) {
            (None, _) => false,
            // No baseline to compare against; record the latest tag only.
            (Some(_), None) => false,
            (Some(l), Some(c)) => compare_versions(l, c) != Ordering::Equal,
        };

        // State is persisted before any notification is attempted.
        let newly_flagged =
            has_update && (!app.has_update || app.latest_version.as_deref() != latest.as_deref());
        self.store
            .set_version_state(app.id, latest.clone(), has_update)
            .await?;

        if newly_flagged {
            let event = NotificationEvent::UpdateAvailable {
                current_version: current,
                // newly_flagged implies has_update, which implies Some.
                latest_version: latest.unwrap_or_default(),
            };
            self.notifier.notify(app, &event).await;
        }

        Ok(has_update)
    }

    /// The fast pod-tracking pass: persists running versions without touching
    /// the registries.
    pub async fn refresh_pod_versions(&self) -> usize {
        let apps = match self.store.get_all_apps().await {
            Ok(apps) => apps,
            Err(e) => {
                error!(error = %e, "Failed to load apps for pod version refresh.");
                return 0;
            }
        };

        let mut refreshed = 0;
        for app in apps {
            if !app.version_checking_enabled {
                continue;
            }
            let Some(version) = self.resolve_running_version(&app).await else {
                continue;
            };
            if app.current_version.as_deref() == Some(version.as_str()) {
                continue;
            }
            match self
                .store
                .set_current_version(app.id, Some(version.clone()))
                .await
            {
                Ok(()) => {
                    info!(app = %app.name, version = %version, "Running version updated from pod.");
                    refreshed += 1;
                }
                Err(e) => {
                    error!(app = %app.name, error = %e, "Failed to persist running version.");
                }
            }
        }
        refreshed
    }

    async fn resolve_running_version(&self, app: &tracked_app::Model) -> Option<String> {
        let resolver = self.pod_resolver.as_ref()?;
        let image = app.docker_image.as_deref()?;
        let namespace = app.k8s_namespace.as_deref()?;
        resolver.version_from_pod(image, namespace).await
    }
}

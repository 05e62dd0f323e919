//! HTTP availability probing with transition-based notifications.
//!
//! Every probe appends a history row. Notifications fire only on an UP/DOWN
//! transition against a process-local status cache, which is lazily seeded
//! from the newest persisted entry so a restart never re-announces a state
//! that was already known.

use std::time::{Duration, Instant};

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, error, info};

use crate::db::entities::{ping_history, ping_preference, tracked_app};
use crate::db::store::{AppStore, NewPingEntry, StoreError};
use crate::notifications::{NotificationEvent, Notifier};
use crate::version::VERSION;

const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// History rows older than this are purged by the daily cleanup job.
pub const HISTORY_RETENTION_DAYS: i64 = 7;

/// Result of one HTTP probe, already classified.
#[derive(Debug, Clone)]
struct ProbeOutcome {
    status: bool,
    response_time_ms: i32,
    status_code: Option<i32>,
    error_message: Option<String>,
}

fn is_success_code(code: u16) -> bool {
    (200..300).contains(&code)
}

/// TLS validation is bypassed only for HTTPS targets that opted in.
fn use_insecure(url: &str, ignore_ssl: bool) -> bool {
    ignore_ssl && url.starts_with("https://")
}

/// The explicit ping URL wins; the app URL is the fallback.
fn resolve_probe_url(app: &tracked_app::Model, pref: &ping_preference::Model) -> Option<String> {
    pref.url
        .as_deref()
        .filter(|u| !u.is_empty())
        .or(app.url.as_deref().filter(|u| !u.is_empty()))
        .map(|u| u.to_string())
}

fn is_due(latest: Option<&ping_history::Model>, frequency_minutes: i32) -> bool {
    match latest {
        None => true,
        Some(entry) => {
            Utc::now() - entry.created_at >= chrono::Duration::minutes(frequency_minutes as i64)
        }
    }
}

pub struct PingMonitor {
    store: Arc<dyn AppStore>,
    notifier: Arc<dyn Notifier>,
    client: Client,
    insecure_client: Client,
    status_cache: DashMap<i32, bool>,
}

impl PingMonitor {
    pub fn new(store: Arc<dyn AppStore>, notifier: Arc<dyn Notifier>) -> Self {
        let user_agent = format!("homedash-ping/{VERSION}");
        let client = Client::builder()
            .user_agent(&user_agent)
            .timeout(PING_TIMEOUT)
            .build()
            .unwrap(); // Should not fail with default settings
        let insecure_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(PING_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .unwrap(); // Should not fail with default settings
        Self {
            store,
            notifier,
            client,
            insecure_client,
            status_cache: DashMap::new(),
        }
    }

    /// Last-known status, preferring the cache and falling back to the
    /// newest persisted entry. `None` when the app has never been probed.
    pub async fn app_status(&self, app_id: i32) -> Option<bool> {
        if let Some(status) = self.status_cache.get(&app_id) {
            return Some(*status);
        }
        match self.store.latest_ping_entry(app_id).await {
            Ok(entry) => entry.map(|e| e.status),
            Err(e) => {
                error!(app_id, error = %e, "Failed to read latest ping entry.");
                None
            }
        }
    }

    /// Probes every ping-enabled app that is due, concurrently. One probe
    /// failing never affects the others.
    pub async fn ping_all(&self) {
        let apps = match self.store.get_apps_with_ping_enabled().await {
            Ok(apps) => apps,
            Err(e) => {
                error!(error = %e, "Failed to load ping-enabled apps.");
                return;
            }
        };

        let probes = apps
            .iter()
            .map(|(app, pref)| self.evaluate(app, pref));
        join_all(probes).await;
    }

    /// Probes one app unconditionally (frequency is the scheduler's concern,
    /// not this method's).
    pub async fn ping_app(&self, app: &tracked_app::Model, pref: &ping_preference::Model) {
        if !pref.enabled {
            return;
        }
        let Some(url) = resolve_probe_url(app, pref) else {
            debug!(app = %app.name, "No probe URL resolves; skipping.");
            return;
        };

        self.seed_status(app.id).await;
        let outcome = self.probe(&url, use_insecure(&url, pref.ignore_ssl)).await;
        self.record_outcome(app, &url, outcome).await;
    }

    /// Deletes history rows past the retention window. Returns the number of
    /// rows removed.
    pub async fn cleanup_history(&self) -> Result<u64, StoreError> {
        let removed = self
            .store
            .cleanup_old_ping_history(HISTORY_RETENTION_DAYS)
            .await?;
        info!(removed, "Ping history cleanup finished.");
        Ok(removed)
    }

    async fn evaluate(&self, app: &tracked_app::Model, pref: &ping_preference::Model) {
        let latest = match self.store.latest_ping_entry(app.id).await {
            Ok(latest) => latest,
            Err(e) => {
                error!(app = %app.name, error = %e, "Failed to load latest ping entry.");
                return;
            }
        };
        if !self.status_cache.contains_key(&app.id) {
            if let Some(entry) = &latest {
                self.status_cache.insert(app.id, entry.status);
            }
        }
        if !is_due(latest.as_ref(), pref.frequency_minutes) {
            return;
        }
        self.ping_app(app, pref).await;
    }

    /// Seeds the cache from the newest persisted entry, once per app.
    async fn seed_status(&self, app_id: i32) {
        if self.status_cache.contains_key(&app_id) {
            return;
        }
        match self.store.latest_ping_entry(app_id).await {
            Ok(Some(entry)) => {
                self.status_cache.insert(app_id, entry.status);
            }
            Ok(None) => {}
            Err(e) => {
                error!(app_id, error = %e, "Failed to seed ping status cache.");
            }
        }
    }

    async fn probe(&self, url: &str, insecure: bool) -> ProbeOutcome {
        let client = if insecure {
            &self.insecure_client
        } else {
            &self.client
        };

        let started = Instant::now();
        match client.get(url).send().await {
            Ok(response) => {
                let elapsed = started.elapsed().as_millis() as i32;
                let code = response.status().as_u16();
                ProbeOutcome {
                    status: is_success_code(code),
                    response_time_ms: elapsed,
                    status_code: Some(code as i32),
                    error_message: None,
                }
            }
            Err(e) => ProbeOutcome {
                status: false,
                response_time_ms: started.elapsed().as_millis() as i32,
                status_code: None,
                error_message: Some(e.to_string()),
            },
        }
    }

    /// Appends the history row, then notifies only when the status differs
    /// from a previously cached value. A failed append skips both the cache
    /// update and the notification so persisted state stays authoritative.
    async fn record_outcome(&self, app: &tracked_app::Model, probe_url: &str, outcome: ProbeOutcome) {
        if let Err(e) = self
            .store
            .add_ping_history(NewPingEntry {
                app_id: app.id,
                status: outcome.status,
                response_time_ms: Some(outcome.response_time_ms),
                status_code: outcome.status_code,
                error_message: outcome.error_message.clone(),
            })
            .await
        {
            error!(app = %app.name, error = %e, "Failed to append ping history.");
            return;
        }

        let previous = self.status_cache.insert(app.id, outcome.status);
        match previous {
            Some(previous) if previous != outcome.status => {
                info!(
                    app = %app.name,
                    up = outcome.status,
                    "Ping status changed."
                );
                let event = NotificationEvent::PingStatusChanged {
                    is_up: outcome.status,
                    probe_url: probe_url.to_string(),
                    response_time_ms: outcome.response_time_ms,
                    status_code: outcome.status_code,
                    error_message: outcome.error_message,
                };
                self.notifier.notify(app, &event).await;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::testing::{sample_app, MemStore};
    use crate::notifications::testing::RecordingNotifier;

    fn outcome(up: bool) -> ProbeOutcome {
        ProbeOutcome {
            status: up,
            response_time_ms: 25,
            status_code: if up { Some(200) } else { None },
            error_message: if up {
                None
            } else {
                Some("connection refused".to_string())
            },
        }
    }

    fn monitor(store: Arc<MemStore>, notifier: Arc<RecordingNotifier>) -> PingMonitor {
        PingMonitor::new(store, notifier)
    }

    #[test]
    fn success_codes_are_the_two_hundreds() {
        assert!(is_success_code(200));
        assert!(is_success_code(204));
        assert!(is_success_code(299));
        assert!(!is_success_code(301));
        assert!(!is_success_code(404));
        assert!(!is_success_code(500));
    }

    #[test]
    fn tls_bypass_applies_only_to_https_targets() {
        assert!(use_insecure("https://nas.local", true));
        assert!(!use_insecure("https://nas.local", false));
        assert!(!use_insecure("http://nas.local", true));
    }

    #[test]
    fn explicit_ping_url_wins_over_the_app_url() {
        let app = sample_app(1, "app");
        let mut pref = ping_preference::Model {
            app_id: 1,
            enabled: true,
            url: Some("https://probe.example.com/health".to_string()),
            frequency_minutes: 5,
            ignore_ssl: false,
        };
        assert_eq!(
            resolve_probe_url(&app, &pref).as_deref(),
            Some("https://probe.example.com/health")
        );

        pref.url = None;
        assert_eq!(
            resolve_probe_url(&app, &pref).as_deref(),
            Some("https://app.example.com")
        );

        let mut bare = sample_app(2, "bare");
        bare.url = None;
        assert_eq!(resolve_probe_url(&bare, &pref), None);
    }

    #[test]
    fn apps_with_no_history_are_always_due() {
        assert!(is_due(None, 60));

        let fresh = ping_history::Model {
            id: 1,
            app_id: 1,
            status: true,
            response_time_ms: Some(10),
            status_code: Some(200),
            error_message: None,
            created_at: Utc::now(),
        };
        assert!(!is_due(Some(&fresh), 60));

        let stale = ping_history::Model {
            created_at: Utc::now() - chrono::Duration::minutes(61),
            ..fresh
        };
        assert!(is_due(Some(&stale), 60));
    }

    #[tokio::test]
    async fn transitions_notify_and_steady_states_stay_quiet() {
        let app = sample_app(1, "app");
        let store = Arc::new(MemStore::with_apps(vec![app.clone()]));
        let notifier = Arc::new(RecordingNotifier::new());
        let monitor = monitor(store.clone(), notifier.clone());

        // UP, UP, DOWN, DOWN, UP: transitions at indices 2 and 4 only.
        for up in [true, true, false, false, true] {
            monitor.record_outcome(&app, "https://app.example.com", outcome(up)).await;
        }

        assert_eq!(store.history_len(1), 5);
        let events = notifier.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0].1,
            NotificationEvent::PingStatusChanged { is_up: false, .. }
        ));
        assert!(matches!(
            events[1].1,
            NotificationEvent::PingStatusChanged { is_up: true, .. }
        ));
    }

    #[tokio::test]
    async fn first_observation_after_cold_start_is_silent() {
        let app = sample_app(1, "app");
        let store = Arc::new(MemStore::with_apps(vec![app.clone()]));
        let notifier = Arc::new(RecordingNotifier::new());
        let monitor = monitor(store.clone(), notifier.clone());

        monitor.record_outcome(&app, "https://app.example.com", outcome(false)).await;

        assert_eq!(store.history_len(1), 1);
        assert_eq!(notifier.count(), 0);
        assert_eq!(monitor.app_status(1).await, Some(false));
    }

    #[tokio::test]
    async fn restart_reseeds_from_history_so_a_real_transition_notifies() {
        let app = sample_app(1, "app");
        let store = Arc::new(MemStore::with_apps(vec![app.clone()]));
        store
            .add_ping_history(NewPingEntry {
                app_id: 1,
                status: true,
                response_time_ms: Some(20),
                status_code: Some(200),
                error_message: None,
            })
            .await
            .unwrap();

        // Fresh monitor simulates a process restart with an empty cache.
        let notifier = Arc::new(RecordingNotifier::new());
        let monitor = monitor(store.clone(), notifier.clone());

        monitor.seed_status(1).await;
        monitor.record_outcome(&app, "https://app.example.com", outcome(false)).await;

        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn disabled_prefs_never_probe() {
        let app = sample_app(1, "app");
        let store = Arc::new(MemStore::with_apps(vec![app.clone()]));
        let notifier = Arc::new(RecordingNotifier::new());
        let monitor = monitor(store.clone(), notifier.clone());

        let pref = ping_preference::Model {
            app_id: 1,
            enabled: false,
            url: None,
            frequency_minutes: 1,
            ignore_ssl: false,
        };
        monitor.ping_app(&app, &pref).await;

        assert_eq!(store.history_len(1), 0);
    }

    #[tokio::test]
    async fn cleanup_reports_the_number_of_rows_removed() {
        let store = Arc::new(MemStore::new());
        // MemStore timestamps rows at insertion, so nothing is past the
        // 7-day window.
        store
            .add_ping_history(NewPingEntry {
                app_id: 1,
                status: true,
                response_time_ms: Some(20),
                status_code: Some(200),
                error_message: None,
            })
            .await
            .unwrap();

        let monitor = monitor(store, Arc::new(RecordingNotifier::new()));
        assert_eq!(monitor.cleanup_history().await.unwrap(), 0);
    }
}

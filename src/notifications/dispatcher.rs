//! Event fan-out to the configured notification channels.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::models::{ChannelConfig, NotificationEvent};
use super::senders::{
    email::EmailSender, telegram::TelegramSender, webhook::WebhookSender, NotificationSender,
    SenderError,
};
use crate::db::entities::tracked_app;
use crate::db::enums::ChannelType;
use crate::db::store::{AppStore, StoreError};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("notification channel {0} not found")]
    ChannelNotFound(i32),
    #[error("no sender registered for channel type {0}")]
    UnsupportedChannel(ChannelType),
    #[error("channel {0} is not fully configured")]
    NotConfigured(ChannelType),
    #[error("invalid channel config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Sender(#[from] SenderError),
}

/// The notification seam consumed by the Update Checker and Ping Monitor.
/// Implementations never raise: a lost notification must not block version or
/// ping state from being persisted.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, app: &tracked_app::Model, event: &NotificationEvent);
}

pub struct NotificationDispatcher {
    store: Arc<dyn AppStore>,
    senders: HashMap<ChannelType, Arc<dyn NotificationSender>>,
}

impl NotificationDispatcher {
    /// Dispatcher with the production sender set.
    pub fn new(store: Arc<dyn AppStore>) -> Self {
        Self::with_senders(
            store,
            vec![
                Arc::new(EmailSender::new()),
                Arc::new(TelegramSender::new()),
                Arc::new(WebhookSender::new()),
            ],
        )
    }

    pub fn with_senders(
        store: Arc<dyn AppStore>,
        senders: Vec<Arc<dyn NotificationSender>>,
    ) -> Self {
        let senders = senders
            .into_iter()
            .map(|s| (s.channel_type(), s))
            .collect();
        Self { store, senders }
    }

    /// Manually exercises one channel. Unlike background fan-out this is a
    /// user-triggered action, so configuration and send errors surface to the
    /// caller.
    pub async fn test_channel(
        &self,
        channel_id: i32,
        message: Option<String>,
    ) -> Result<(), DispatchError> {
        let channel = self
            .store
            .notification_channel(channel_id)
            .await?
            .ok_or(DispatchError::ChannelNotFound(channel_id))?;

        let sender = self
            .senders
            .get(&channel.channel_type)
            .ok_or(DispatchError::UnsupportedChannel(channel.channel_type))?;

        let config: ChannelConfig = serde_json::from_value(channel.config)?;
        if !sender.is_configured(&config) {
            return Err(DispatchError::NotConfigured(channel.channel_type));
        }

        let body =
            message.unwrap_or_else(|| "This is a test notification from homedash.".to_string());
        sender
            .send(&config, "homedash test notification", &body)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for NotificationDispatcher {
    async fn notify(&self, app: &tracked_app::Model, event: &NotificationEvent) {
        let channels = match self.store.notification_channels().await {
            Ok(channels) => channels,
            Err(e) => {
                error!(app = %app.name, error = %e, "Failed to load notification channels.");
                return;
            }
        };

        let app_prefs: HashMap<ChannelType, bool> =
            match self.store.app_notification_preferences(app.id).await {
                Ok(prefs) => prefs.into_iter().map(|p| (p.channel_type, p.enabled)).collect(),
                Err(e) => {
                    error!(app = %app.name, error = %e, "Failed to load notification preferences.");
                    return;
                }
            };

        let subject = event.subject(app);
        let message = event.message(app);

        let mut sends = Vec::new();
        for channel in channels {
            if !channel.enabled {
                continue;
            }
            // Missing preference row means opted in.
            if !app_prefs.get(&channel.channel_type).copied().unwrap_or(true) {
                debug!(app = %app.name, channel = %channel.channel_type, "App opted out of channel.");
                continue;
            }
            let Some(sender) = self.senders.get(&channel.channel_type) else {
                warn!(channel = %channel.channel_type, "No sender registered for channel type.");
                continue;
            };
            let config: ChannelConfig = match serde_json::from_value(channel.config.clone()) {
                Ok(config) => config,
                Err(e) => {
                    error!(channel = %channel.channel_type, error = %e, "Invalid channel config.");
                    continue;
                }
            };
            if !sender.is_configured(&config) {
                debug!(channel = %channel.channel_type, "Channel not configured; skipping.");
                continue;
            }

            let sender = Arc::clone(sender);
            let channel_type = channel.channel_type;
            let app_name = app.name.clone();
            let subject = subject.clone();
            let message = message.clone();
            sends.push(async move {
                if let Err(e) = sender.send(&config, &subject, &message).await {
                    error!(
                        app = %app_name,
                        channel = %channel_type,
                        error = %e,
                        "Notification send failed."
                    );
                }
            });
        }

        // Wait for every send to settle; one channel failing must not affect
        // the others or the caller.
        join_all(sends).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::db::entities::{app_notification_preference, notification_channel};
    use crate::db::store::testing::{sample_app, MemStore};

    struct RecordingSender {
        channel_type: ChannelType,
        fail: bool,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSender {
        fn new(channel_type: ChannelType) -> Arc<Self> {
            Arc::new(Self {
                channel_type,
                fail: false,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(channel_type: ChannelType) -> Arc<Self> {
            Arc::new(Self {
                channel_type,
                fail: true,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        fn channel_type(&self) -> ChannelType {
            self.channel_type
        }

        fn is_configured(&self, _config: &ChannelConfig) -> bool {
            true
        }

        async fn send(
            &self,
            _config: &ChannelConfig,
            subject: &str,
            message: &str,
        ) -> Result<(), SenderError> {
            self.calls
                .lock()
                .unwrap()
                .push((subject.to_string(), message.to_string()));
            if self.fail {
                return Err(SenderError::SendFailed("mock failure".to_string()));
            }
            Ok(())
        }
    }

    fn channel_row(id: i32, channel_type: ChannelType, enabled: bool) -> notification_channel::Model {
        let config = match channel_type {
            ChannelType::Telegram => ChannelConfig::Telegram {
                bot_token: "token".to_string(),
                chat_id: "42".to_string(),
            },
            _ => ChannelConfig::Webhook {
                url: "https://hooks.example.com".to_string(),
                method: "POST".to_string(),
                headers: None,
            },
        };
        notification_channel::Model {
            id,
            channel_type,
            enabled,
            config: serde_json::to_value(config).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn event() -> NotificationEvent {
        NotificationEvent::UpdateAvailable {
            current_version: Some("v1.0.0".to_string()),
            latest_version: "v1.1.0".to_string(),
        }
    }

    #[tokio::test]
    async fn one_failing_channel_does_not_block_the_others() {
        let store = Arc::new(MemStore::with_apps(vec![sample_app(1, "app")]));
        store.channels.lock().unwrap().extend([
            channel_row(1, ChannelType::Telegram, true),
            channel_row(2, ChannelType::Webhook, true),
        ]);

        let telegram = RecordingSender::new(ChannelType::Telegram);
        let webhook = RecordingSender::failing(ChannelType::Webhook);
        let dispatcher = NotificationDispatcher::with_senders(
            store.clone(),
            vec![telegram.clone(), webhook.clone()],
        );

        let app = store.app_snapshot(1).unwrap();
        dispatcher.notify(&app, &event()).await;

        assert_eq!(telegram.call_count(), 1);
        assert_eq!(webhook.call_count(), 1);
    }

    #[tokio::test]
    async fn globally_disabled_channels_are_skipped() {
        let store = Arc::new(MemStore::with_apps(vec![sample_app(1, "app")]));
        store
            .channels
            .lock()
            .unwrap()
            .push(channel_row(1, ChannelType::Telegram, false));

        let telegram = RecordingSender::new(ChannelType::Telegram);
        let dispatcher = NotificationDispatcher::with_senders(store.clone(), vec![telegram.clone()]);

        let app = store.app_snapshot(1).unwrap();
        dispatcher.notify(&app, &event()).await;

        assert_eq!(telegram.call_count(), 0);
    }

    #[tokio::test]
    async fn app_opt_out_overrides_the_global_enable() {
        let store = Arc::new(MemStore::with_apps(vec![sample_app(1, "app")]));
        store
            .channels
            .lock()
            .unwrap()
            .push(channel_row(1, ChannelType::Telegram, true));
        store.channel_prefs.lock().unwrap().push(
            app_notification_preference::Model {
                app_id: 1,
                channel_type: ChannelType::Telegram,
                enabled: false,
            },
        );

        let telegram = RecordingSender::new(ChannelType::Telegram);
        let dispatcher = NotificationDispatcher::with_senders(store.clone(), vec![telegram.clone()]);

        let app = store.app_snapshot(1).unwrap();
        dispatcher.notify(&app, &event()).await;

        assert_eq!(telegram.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_preference_row_means_opted_in() {
        let store = Arc::new(MemStore::with_apps(vec![sample_app(1, "app")]));
        store
            .channels
            .lock()
            .unwrap()
            .push(channel_row(1, ChannelType::Telegram, true));

        let telegram = RecordingSender::new(ChannelType::Telegram);
        let dispatcher = NotificationDispatcher::with_senders(store.clone(), vec![telegram.clone()]);

        let app = store.app_snapshot(1).unwrap();
        dispatcher.notify(&app, &event()).await;

        assert_eq!(telegram.call_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_surfaces_not_found_and_send_errors() {
        let store = Arc::new(MemStore::new());
        store
            .channels
            .lock()
            .unwrap()
            .push(channel_row(1, ChannelType::Telegram, true));

        let telegram = RecordingSender::failing(ChannelType::Telegram);
        let dispatcher = NotificationDispatcher::with_senders(store, vec![telegram]);

        assert!(matches!(
            dispatcher.test_channel(99, None).await,
            Err(DispatchError::ChannelNotFound(99))
        ));
        assert!(matches!(
            dispatcher.test_channel(1, None).await,
            Err(DispatchError::Sender(_))
        ));
    }
}

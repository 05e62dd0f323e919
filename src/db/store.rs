//! The persistence contract consumed by the core services.
//!
//! `AppStore` is the seam between the update/ping core and the database: the
//! production implementation delegates to the SeaORM query services, while
//! tests substitute an in-memory store.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr};
use thiserror::Error;

use crate::db::entities::{
    app_notification_preference, notification_channel, ping_history, ping_preference, tracked_app,
};
use crate::db::services;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Parameters for one appended ping history row.
#[derive(Debug, Clone)]
pub struct NewPingEntry {
    pub app_id: i32,
    pub status: bool,
    pub response_time_ms: Option<i32>,
    pub status_code: Option<i32>,
    pub error_message: Option<String>,
}

#[async_trait]
pub trait AppStore: Send + Sync {
    async fn get_all_apps(&self) -> Result<Vec<tracked_app::Model>, StoreError>;

    async fn get_app(&self, app_id: i32) -> Result<Option<tracked_app::Model>, StoreError>;

    async fn get_apps_with_ping_enabled(
        &self,
    ) -> Result<Vec<(tracked_app::Model, ping_preference::Model)>, StoreError>;

    async fn set_current_version(
        &self,
        app_id: i32,
        version: Option<String>,
    ) -> Result<(), StoreError>;

    async fn set_version_state(
        &self,
        app_id: i32,
        latest_version: Option<String>,
        has_update: bool,
    ) -> Result<(), StoreError>;

    async fn add_ping_history(&self, entry: NewPingEntry) -> Result<(), StoreError>;

    async fn latest_ping_entry(
        &self,
        app_id: i32,
    ) -> Result<Option<ping_history::Model>, StoreError>;

    async fn ping_history(
        &self,
        app_id: i32,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ping_history::Model>, StoreError>;

    async fn cleanup_old_ping_history(&self, retention_days: i64) -> Result<u64, StoreError>;

    async fn notification_channels(&self) -> Result<Vec<notification_channel::Model>, StoreError>;

    async fn notification_channel(
        &self,
        channel_id: i32,
    ) -> Result<Option<notification_channel::Model>, StoreError>;

    async fn app_notification_preferences(
        &self,
        app_id: i32,
    ) -> Result<Vec<app_notification_preference::Model>, StoreError>;
}

/// SeaORM-backed store used by the running server.
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AppStore for DbStore {
    async fn get_all_apps(&self) -> Result<Vec<tracked_app::Model>, StoreError> {
        Ok(services::get_all_apps(&self.db).await?)
    }

    async fn get_app(&self, app_id: i32) -> Result<Option<tracked_app::Model>, StoreError> {
        Ok(services::get_app_by_id(&self.db, app_id).await?)
    }

    async fn get_apps_with_ping_enabled(
        &self,
    ) -> Result<Vec<(tracked_app::Model, ping_preference::Model)>, StoreError> {
        Ok(services::get_apps_with_ping_enabled(&self.db).await?)
    }

    async fn set_current_version(
        &self,
        app_id: i32,
        version: Option<String>,
    ) -> Result<(), StoreError> {
        Ok(services::set_current_version(&self.db, app_id, version).await?)
    }

    async fn set_version_state(
        &self,
        app_id: i32,
        latest_version: Option<String>,
        has_update: bool,
    ) -> Result<(), StoreError> {
        Ok(services::set_version_state(&self.db, app_id, latest_version, has_update).await?)
    }

    async fn add_ping_history(&self, entry: NewPingEntry) -> Result<(), StoreError> {
        services::add_ping_history(
            &self.db,
            entry.app_id,
            entry.status,
            entry.response_time_ms,
            entry.status_code,
            entry.error_message,
        )
        .await?;
        Ok(())
    }

    async fn latest_ping_entry(
        &self,
        app_id: i32,
    ) -> Result<Option<ping_history::Model>, StoreError> {
        Ok(services::get_latest_ping_entry(&self.db, app_id).await?)
    }

    async fn ping_history(
        &self,
        app_id: i32,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ping_history::Model>, StoreError> {
        Ok(services::get_ping_history(&self.db, app_id, limit, offset).await?)
    }

    async fn cleanup_old_ping_history(&self, retention_days: i64) -> Result<u64, StoreError> {
        Ok(services::cleanup_old_ping_history(&self.db, retention_days).await?)
    }

    async fn notification_channels(&self) -> Result<Vec<notification_channel::Model>, StoreError> {
        Ok(services::get_all_channels(&self.db).await?)
    }

    async fn notification_channel(
        &self,
        channel_id: i32,
    ) -> Result<Option<notification_channel::Model>, StoreError> {
        Ok(services::get_channel_by_id(&self.db, channel_id).await?)
    }

    async fn app_notification_preferences(
        &self,
        app_id: i32,
    ) -> Result<Vec<app_notification_preference::Model>, StoreError> {
        Ok(services::get_app_notification_preferences(&self.db, app_id).await?)
    }
}

//! Queries for notification channel configuration and per-app opt-outs.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};

use crate::db::entities::{app_notification_preference, notification_channel, prelude::*};

pub async fn get_all_channels(
    db: &DatabaseConnection,
) -> Result<Vec<notification_channel::Model>, DbErr> {
    NotificationChannel::find().all(db).await
}

pub async fn get_channel_by_id(
    db: &DatabaseConnection,
    channel_id: i32,
) -> Result<Option<notification_channel::Model>, DbErr> {
    NotificationChannel::find_by_id(channel_id).one(db).await
}

pub async fn get_app_notification_preferences(
    db: &DatabaseConnection,
    app_id: i32,
) -> Result<Vec<app_notification_preference::Model>, DbErr> {
    AppNotificationPreference::find()
        .filter(app_notification_preference::Column::AppId.eq(app_id))
        .all(db)
        .await
}

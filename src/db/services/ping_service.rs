//! Queries for the append-only ping history.

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

use crate::db::entities::{ping_history, prelude::*};

pub async fn add_ping_history(
    db: &DatabaseConnection,
    app_id: i32,
    status: bool,
    response_time_ms: Option<i32>,
    status_code: Option<i32>,
    error_message: Option<String>,
) -> Result<ping_history::Model, DbErr> {
    let entry = ping_history::ActiveModel {
        id: NotSet,
        app_id: Set(app_id),
        status: Set(status),
        response_time_ms: Set(response_time_ms),
        status_code: Set(status_code),
        error_message: Set(error_message),
        created_at: Set(Utc::now()),
    };
    entry.insert(db).await
}

pub async fn get_latest_ping_entry(
    db: &DatabaseConnection,
    app_id: i32,
) -> Result<Option<ping_history::Model>, DbErr> {
    PingHistory::find()
        .filter(ping_history::Column::AppId.eq(app_id))
        .order_by_desc(ping_history::Column::CreatedAt)
        .one(db)
        .await
}

pub async fn get_ping_history(
    db: &DatabaseConnection,
    app_id: i32,
    limit: u64,
    offset: u64,
) -> Result<Vec<ping_history::Model>, DbErr> {
    PingHistory::find()
        .filter(ping_history::Column::AppId.eq(app_id))
        .order_by_desc(ping_history::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await
}

/// Deletes entries older than `retention_days`, returning the number removed.
pub async fn cleanup_old_ping_history(
    db: &DatabaseConnection,
    retention_days: i64,
) -> Result<u64, DbErr> {
    let cutoff = Utc::now() - Duration::days(retention_days);
    let result = PingHistory::delete_many()
        .filter(ping_history::Column::CreatedAt.lt(cutoff))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

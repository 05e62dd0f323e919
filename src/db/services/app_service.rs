//! Queries for tracked apps and their version state.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::db::entities::{ping_preference, prelude::*, tracked_app};

pub async fn get_all_apps(db: &DatabaseConnection) -> Result<Vec<tracked_app::Model>, DbErr> {
    TrackedApp::find().all(db).await
}

pub async fn get_app_by_id(
    db: &DatabaseConnection,
    app_id: i32,
) -> Result<Option<tracked_app::Model>, DbErr> {
    TrackedApp::find_by_id(app_id).one(db).await
}

/// Apps that have ping monitoring switched on, paired with their preferences.
pub async fn get_apps_with_ping_enabled(
    db: &DatabaseConnection,
) -> Result<Vec<(tracked_app::Model, ping_preference::Model)>, DbErr> {
    let rows = TrackedApp::find()
        .find_also_related(PingPreference)
        .filter(ping_preference::Column::Enabled.eq(true))
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(app, prefs)| prefs.map(|p| (app, p)))
        .collect())
}

/// Persists a newly observed running version. Called by the Update Checker
/// only; user-owned fields are untouched.
pub async fn set_current_version(
    db: &DatabaseConnection,
    app_id: i32,
    version: Option<String>,
) -> Result<(), DbErr> {
    let app = TrackedApp::find_by_id(app_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("tracked app {app_id} not found")))?;

    let mut active: tracked_app::ActiveModel = app.into();
    active.current_version = Set(version);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

/// Persists the outcome of a latest-version comparison.
pub async fn set_version_state(
    db: &DatabaseConnection,
    app_id: i32,
    latest_version: Option<String>,
    has_update: bool,
) -> Result<(), DbErr> {
    let app = TrackedApp::find_by_id(app_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("tracked app {app_id} not found")))?;

    let mut active: tracked_app::ActiveModel = app.into();
    active.latest_version = Set(latest_version);
    active.has_update = Set(has_update);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}

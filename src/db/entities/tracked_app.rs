use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::VersionSource;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "tracked_apps")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(nullable)]
    pub url: Option<String>,
    #[sea_orm(nullable)]
    pub category: Option<String>,
    /// Image the Pod Version Resolver matches against (e.g. `ghcr.io/acme/app`).
    #[sea_orm(nullable)]
    pub docker_image: Option<String>,
    #[sea_orm(nullable)]
    pub k8s_namespace: Option<String>,
    #[sea_orm(nullable)]
    pub source_type: Option<VersionSource>,
    #[sea_orm(nullable)]
    pub source_repo: Option<String>,
    #[sea_orm(nullable)]
    pub current_version: Option<String>,
    #[sea_orm(nullable)]
    pub latest_version: Option<String>,
    /// Derived by the Update Checker only, never set directly.
    pub has_update: bool,
    pub version_checking_enabled: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ping_history::Entity")]
    PingHistory,

    #[sea_orm(has_one = "super::ping_preference::Entity")]
    PingPreference,

    #[sea_orm(has_many = "super::app_notification_preference::Entity")]
    AppNotificationPreference,
}

impl Related<super::ping_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PingHistory.def()
    }
}

impl Related<super::ping_preference::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PingPreference.def()
    }
}

impl Related<super::app_notification_preference::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppNotificationPreference.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only record of one probe. Never mutated; trimmed by the daily
/// retention job.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "ping_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub app_id: i32,
    pub status: bool,
    #[sea_orm(nullable)]
    pub response_time_ms: Option<i32>,
    #[sea_orm(nullable)]
    pub status_code: Option<i32>,
    #[sea_orm(nullable)]
    pub error_message: Option<String>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tracked_app::Entity",
        from = "Column::AppId",
        to = "super::tracked_app::Column::Id",
        on_delete = "Cascade"
    )]
    TrackedApp,
}

impl Related<super::tracked_app::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TrackedApp.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

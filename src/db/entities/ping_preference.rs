use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "ping_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub app_id: i32,
    pub enabled: bool,
    /// Probe target. Falls back to the app's own URL when unset.
    #[sea_orm(nullable)]
    pub url: Option<String>,
    /// Probe cadence, clamped to [1, 1440] by the controller layer.
    pub frequency_minutes: i32,
    pub ignore_ssl: bool,
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

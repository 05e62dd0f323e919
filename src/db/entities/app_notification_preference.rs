use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::enums::ChannelType;

/// Per-(app, channel) opt-out. Absence of a row means the channel is enabled
/// for the app.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "app_notification_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub app_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub channel_type: ChannelType,
    pub enabled: bool,
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

//! SeaORM entities that map to database tables.

pub mod app_notification_preference;
pub mod notification_channel;
pub mod ping_history;
pub mod ping_preference;
pub mod tracked_app;

// Prelude module for easy importing of all entities and their related types.
pub mod prelude {
    pub use super::tracked_app::ActiveModel as TrackedAppActiveModel;
    pub use super::tracked_app::Column as TrackedAppColumn;
    pub use super::tracked_app::Entity as TrackedApp;
    pub use super::tracked_app::Model as TrackedAppModel;

    pub use super::ping_preference::ActiveModel as PingPreferenceActiveModel;
    pub use super::ping_preference::Column as PingPreferenceColumn;
    pub use super::ping_preference::Entity as PingPreference;
    pub use super::ping_preference::Model as PingPreferenceModel;

    pub use super::ping_history::ActiveModel as PingHistoryActiveModel;
    pub use super::ping_history::Column as PingHistoryColumn;
    pub use super::ping_history::Entity as PingHistory;
    pub use super::ping_history::Model as PingHistoryModel;

    pub use super::notification_channel::ActiveModel as NotificationChannelActiveModel;
    pub use super::notification_channel::Column as NotificationChannelColumn;
    pub use super::notification_channel::Entity as NotificationChannel;
    pub use super::notification_channel::Model as NotificationChannelModel;

    pub use super::app_notification_preference::ActiveModel as AppNotificationPreferenceActiveModel;
    pub use super::app_notification_preference::Column as AppNotificationPreferenceColumn;
    pub use super::app_notification_preference::Entity as AppNotificationPreference;
    pub use super::app_notification_preference::Model as AppNotificationPreferenceModel;
}

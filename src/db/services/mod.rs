//! High-level query API over the database. Encapsulates all SeaORM access so
//! the core services work with entity models without knowing the schema.

pub mod app_service;
pub mod notification_channel_service;
pub mod ping_service;

pub use app_service::*;
pub use notification_channel_service::*;
pub use ping_service::*;

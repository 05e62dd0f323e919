pub mod config;
pub mod db;
pub mod monitoring;
pub mod notifications;
pub mod scheduler;
pub mod version;
pub mod versioning;

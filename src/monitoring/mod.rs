pub mod ping_monitor;

pub use ping_monitor::{PingMonitor, HISTORY_RETENTION_DAYS};

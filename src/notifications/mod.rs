pub mod dispatcher;
pub mod models;
pub mod senders;

pub use dispatcher::{DispatchError, NotificationDispatcher, Notifier};
pub use models::{ChannelConfig, EmailSecurity, NotificationEvent};

#[cfg(test)]
pub mod testing {
    //! Notifier mock shared by the update checker and ping monitor tests.

    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::models::NotificationEvent;
    use super::Notifier;
    use crate::db::entities::tracked_app;

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub events: Mutex<Vec<(i32, NotificationEvent)>>,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn count(&self) -> usize {
            self.events.lock().unwrap().len()
        }

        pub fn events(&self) -> Vec<(i32, NotificationEvent)> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, app: &tracked_app::Model, event: &NotificationEvent) {
            self.events.lock().unwrap().push((app.id, event.clone()));
        }
    }
}

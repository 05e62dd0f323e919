use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::entities::tracked_app;

/// Typed configuration for one notification channel, stored as tagged JSON in
/// the `notification_channels.config` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChannelConfig {
    #[serde(rename_all = "camelCase")]
    Email {
        smtp_host: String,
        smtp_port: u16,
        #[serde(default)]
        security: EmailSecurity,
        from_email: String,
        to_email: String,
        #[serde(default)]
        smtp_user: Option<String>,
        #[serde(default)]
        smtp_password: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Telegram { bot_token: String, chat_id: String },
    #[serde(rename_all = "camelCase")]
    Webhook {
        url: String,
        /// "GET" or "POST".
        method: String,
        #[serde(default)]
        headers: Option<HashMap<String, String>>,
    },
}

/// SMTP connection security. `Auto` keys off the port: 465 means implicit
/// TLS, 587/25 mean STARTTLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailSecurity {
    #[default]
    Auto,
    None,
    Tls,
    Starttls,
}

/// One event fanned out to the enabled channels of an app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    UpdateAvailable {
        current_version: Option<String>,
        latest_version: String,
    },
    PingStatusChanged {
        is_up: bool,
        probe_url: String,
        response_time_ms: i32,
        status_code: Option<i32>,
        error_message: Option<String>,
    },
}

impl NotificationEvent {
    pub fn subject(&self, app: &tracked_app::Model) -> String {
        match self {
            NotificationEvent::UpdateAvailable { .. } => {
                format!("Update Available: {}", app.name)
            }
            NotificationEvent::PingStatusChanged { is_up, .. } => {
                format!("{} is {}", app.name, if *is_up { "UP" } else { "DOWN" })
            }
        }
    }

    pub fn message(&self, app: &tracked_app::Model) -> String {
        match self {
            NotificationEvent::UpdateAvailable {
                current_version,
                latest_version,
            } => {
                let current = current_version.as_deref().unwrap_or("unknown");
                let mut body = format!(
                    "{} can be updated from {} to {}.",
                    app.name, current, latest_version
                );
                if let Some(url) = &app.url {
                    body.push_str(&format!("\n{url}"));
                }
                body
            }
            NotificationEvent::PingStatusChanged {
                is_up,
                probe_url,
                response_time_ms,
                error_message,
                ..
            } => {
                let mut body = format!("Probe target: {probe_url}");
                if *is_up {
                    body.push_str(&format!("\nResponse time: {response_time_ms} ms"));
                } else if let Some(error) = error_message {
                    body.push_str(&format!("\nError: {error}"));
                }
                body
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::testing::sample_app;

    #[test]
    fn channel_config_round_trips_with_camel_case_keys() {
        let config = ChannelConfig::Telegram {
            bot_token: "token".to_string(),
            chat_id: "42".to_string(),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "telegram");
        assert_eq!(json["botToken"], "token");

        let parsed: ChannelConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn email_security_defaults_to_auto() {
        let config: ChannelConfig = serde_json::from_value(serde_json::json!({
            "type": "email",
            "smtpHost": "mail.example.com",
            "smtpPort": 465,
            "fromEmail": "a@example.com",
            "toEmail": "b@example.com"
        }))
        .unwrap();

        match config {
            ChannelConfig::Email { security, .. } => assert_eq!(security, EmailSecurity::Auto),
            other => panic!("unexpected config: {other:?}"),
        }
    }

    #[test]
    fn subjects_follow_the_event_kind() {
        let app = sample_app(1, "jellyfin");

        let update = NotificationEvent::UpdateAvailable {
            current_version: Some("v1.0.0".to_string()),
            latest_version: "v1.1.0".to_string(),
        };
        assert_eq!(update.subject(&app), "Update Available: jellyfin");

        let down = NotificationEvent::PingStatusChanged {
            is_up: false,
            probe_url: "https://jellyfin.example.com".to_string(),
            response_time_ms: 120,
            status_code: None,
            error_message: Some("connection refused".to_string()),
        };
        assert_eq!(down.subject(&app), "jellyfin is DOWN");
        assert!(down.message(&app).contains("connection refused"));
    }
}

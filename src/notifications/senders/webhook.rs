use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{NotificationSender, SenderError};
use crate::db::enums::ChannelType;
use crate::notifications::models::ChannelConfig;

/// Pushes notifications to a user-supplied HTTP endpoint.
pub struct WebhookSender {
    client: Client,
}

impl Default for WebhookSender {
    fn default() -> Self {
        Self::new()
    }
}

impl WebhookSender {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    subject: &'a str,
    message: &'a str,
}

#[async_trait]
impl NotificationSender for WebhookSender {
    fn channel_type(&self) -> ChannelType {
        ChannelType::Webhook
    }

    fn is_configured(&self, config: &ChannelConfig) -> bool {
        matches!(config, ChannelConfig::Webhook { url, .. } if !url.is_empty())
    }

    async fn send(
        &self,
        config: &ChannelConfig,
        subject: &str,
        message: &str,
    ) -> Result<(), SenderError> {
        let (url, method, headers) = match config {
            ChannelConfig::Webhook {
                url,
                method,
                headers,
            } => (url, method, headers),
            _ => {
                return Err(SenderError::InvalidConfiguration(
                    "Expected Webhook config, but found a different type.".to_string(),
                ));
            }
        };

        let mut request = if method.eq_ignore_ascii_case("get") {
            self.client.get(url)
        } else {
            self.client
                .post(url)
                .json(&WebhookPayload { subject, message })
        };

        if let Some(headers) = headers {
            for (name, value) in headers {
                request = request.header(name, value);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SenderError::SendFailed(format!(
                "Webhook endpoint returned non-success status: {status}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_requires_a_url() {
        let sender = WebhookSender::new();
        assert!(sender.is_configured(&ChannelConfig::Webhook {
            url: "https://hooks.example.com/notify".to_string(),
            method: "POST".to_string(),
            headers: None,
        }));
        assert!(!sender.is_configured(&ChannelConfig::Webhook {
            url: String::new(),
            method: "POST".to_string(),
            headers: None,
        }));
    }
}

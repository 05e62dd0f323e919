use async_trait::async_trait;
use thiserror::Error;

use super::models::ChannelConfig;
use crate::db::enums::ChannelType;

pub mod email;
pub mod telegram;
pub mod webhook;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("failed to send notification: {0}")]
    SendFailed(String),
    #[error("invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("email build error: {0}")]
    Email(#[from] lettre::error::Error),
}

/// A transport for one channel type. The dispatcher resolves senders through
/// a `ChannelType`-keyed registry, never by identity.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    fn channel_type(&self) -> ChannelType;

    /// True when all required config keys are present and non-empty. Channels
    /// failing this are silently skipped during background fan-out.
    fn is_configured(&self, config: &ChannelConfig) -> bool;

    async fn send(
        &self,
        config: &ChannelConfig,
        subject: &str,
        message: &str,
    ) -> Result<(), SenderError>;
}

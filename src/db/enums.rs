use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry a tracked app's version tags are fetched from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text", enum_name = "version_source_enum")]
pub enum VersionSource {
    #[sea_orm(string_value = "GITHUB_RELEASES")]
    GithubReleases,
    #[sea_orm(string_value = "GHCR")]
    Ghcr,
    #[sea_orm(string_value = "DOCKER_HUB")]
    DockerHub,
    #[sea_orm(string_value = "K8S_REGISTRY")]
    K8sRegistry,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text", enum_name = "channel_type_enum")]
pub enum ChannelType {
    #[sea_orm(string_value = "email")]
    Email,
    #[sea_orm(string_value = "telegram")]
    Telegram,
    #[sea_orm(string_value = "webhook")]
    Webhook,
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelType::Email => write!(f, "email"),
            ChannelType::Telegram => write!(f, "telegram"),
            ChannelType::Webhook => write!(f, "webhook"),
        }
    }
}

use async_trait::async_trait;
use crate::application::errors::StorageError;
use crate::domain::entities::{ConfigMap, GuildPluginConfig};

/// Connection state of a durable backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Connecting,
    Disconnecting,
}

impl ConnectionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Store trait - durable persistence for per-guild plugin configuration
#[async_trait]
pub trait Store: Send + Sync {
    /// Point-in-time connection state; says nothing about the next call
    fn state(&self) -> ConnectionState;

    async fn find(
        &self,
        guild_id: &str,
        plugin_name: &str,
    ) -> Result<Option<GuildPluginConfig>, StorageError>;

    /// Upsert the enabled flag, creating the record with defaults if needed
    async fn set_enabled(
        &self,
        guild_id: &str,
        plugin_name: &str,
        enabled: bool,
    ) -> Result<GuildPluginConfig, StorageError>;

    /// Upsert the config object, creating the record with defaults if needed
    async fn set_config(
        &self,
        guild_id: &str,
        plugin_name: &str,
        config: &ConfigMap,
    ) -> Result<GuildPluginConfig, StorageError>;
}

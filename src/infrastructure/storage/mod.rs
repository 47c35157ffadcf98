//! In-memory storage implementation

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::{ConfigMap, GuildPluginConfig};
use crate::domain::traits::{ConnectionState, Store};

type RecordKey = (String, String);

/// Process-local store with a switchable connection state.
///
/// While not `Connected` every call fails with `StorageError::Unavailable`,
/// which is how an outage of a real backend looks to callers.
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<RecordKey, GuildPluginConfig>>>,
    state: AtomicU8,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            state: AtomicU8::new(encode(ConnectionState::Connected)),
        }
    }

    pub fn set_state(&self, state: ConnectionState) {
        self.state.store(encode(state), Ordering::SeqCst);
    }

    /// Number of stored records, regardless of connection state
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_connected(&self) -> Result<(), StorageError> {
        if self.state().is_ready() {
            Ok(())
        } else {
            Err(StorageError::Unavailable)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(state: ConnectionState) -> u8 {
    match state {
        ConnectionState::Disconnected => 0,
        ConnectionState::Connected => 1,
        ConnectionState::Connecting => 2,
        ConnectionState::Disconnecting => 3,
    }
}

fn decode(code: u8) -> ConnectionState {
    match code {
        1 => ConnectionState::Connected,
        2 => ConnectionState::Connecting,
        3 => ConnectionState::Disconnecting,
        _ => ConnectionState::Disconnected,
    }
}

fn key(guild_id: &str, plugin_name: &str) -> RecordKey {
    (guild_id.to_string(), plugin_name.to_string())
}

#[async_trait]
impl Store for MemoryStore {
    fn state(&self) -> ConnectionState {
        decode(self.state.load(Ordering::SeqCst))
    }

    async fn find(
        &self,
        guild_id: &str,
        plugin_name: &str,
    ) -> Result<Option<GuildPluginConfig>, StorageError> {
        self.ensure_connected()?;
        let records = self.records.read().await;
        Ok(records.get(&key(guild_id, plugin_name)).cloned())
    }

    async fn set_enabled(
        &self,
        guild_id: &str,
        plugin_name: &str,
        enabled: bool,
    ) -> Result<GuildPluginConfig, StorageError> {
        self.ensure_connected()?;
        let mut records = self.records.write().await;
        let record = records
            .entry(key(guild_id, plugin_name))
            .or_insert_with(|| GuildPluginConfig::new(guild_id, plugin_name));
        record.set_enabled(enabled);
        Ok(record.clone())
    }

    async fn set_config(
        &self,
        guild_id: &str,
        plugin_name: &str,
        config: &ConfigMap,
    ) -> Result<GuildPluginConfig, StorageError> {
        self.ensure_connected()?;
        let mut records = self.records.write().await;
        let record = records
            .entry(key(guild_id, plugin_name))
            .or_insert_with(|| GuildPluginConfig::new(guild_id, plugin_name));
        record.set_config(config.clone());
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_creates_defaults() {
        let store = MemoryStore::new();
        let record = store.set_enabled("g", "welcome", false).await.unwrap();
        assert!(!record.enabled);
        assert!(record.config.is_empty());

        let mut config = ConfigMap::new();
        config.insert("welcomeChannel".to_string(), "1".into());
        let record = store.set_config("g", "welcome", &config).await.unwrap();
        assert!(!record.enabled);
        assert_eq!(record.config, config);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_disconnected_store_fails() {
        let store = MemoryStore::new();
        store.set_state(ConnectionState::Disconnected);
        assert!(matches!(
            store.find("g", "p").await,
            Err(StorageError::Unavailable)
        ));
        assert!(store.set_enabled("g", "p", true).await.is_err());
        assert!(store.is_empty().await);
    }
}

//! Per-guild plugin configuration with an in-memory fallback
//!
//! Reads and writes go to the durable store while it reports `Connected`.
//! When it does not, or a call fails, the value goes to a process-local cache
//! instead. Cached writes are never copied back once the store recovers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::entities::{CachedGuildConfig, ConfigMap};
use crate::domain::traits::Store;

type CacheKey = (String, String);

pub struct ConfigStore {
    durable: Option<Arc<dyn Store>>,
    cache: RwLock<HashMap<CacheKey, CachedGuildConfig>>,
}

impl ConfigStore {
    pub fn new(durable: Option<Arc<dyn Store>>) -> Self {
        Self {
            durable,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cache-only store
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Whether the durable backend is connected right now
    pub fn is_available(&self) -> bool {
        self.ready_store().is_some()
    }

    fn ready_store(&self) -> Option<&Arc<dyn Store>> {
        self.durable.as_ref().filter(|store| store.state().is_ready())
    }

    /// Stored flag, or `true` when the pair has no record
    pub async fn get_enabled(&self, guild_id: &str, plugin_name: &str) -> bool {
        if let Some(store) = self.ready_store() {
            match store.find(guild_id, plugin_name).await {
                Ok(record) => return record.map(|r| r.enabled).unwrap_or(true),
                Err(e) => warn!(
                    guild = %guild_id,
                    plugin = %plugin_name,
                    "Failed to read plugin state, using cache: {}",
                    e
                ),
            }
        }

        self.cache
            .read()
            .await
            .get(&key(guild_id, plugin_name))
            .and_then(|entry| entry.enabled)
            .unwrap_or(true)
    }

    pub async fn set_enabled(&self, guild_id: &str, plugin_name: &str, enabled: bool) {
        if let Some(store) = self.ready_store() {
            match store.set_enabled(guild_id, plugin_name, enabled).await {
                Ok(_) => return,
                Err(e) => warn!(
                    guild = %guild_id,
                    plugin = %plugin_name,
                    "Failed to persist plugin state, keeping it in memory: {}",
                    e
                ),
            }
        }

        self.cache
            .write()
            .await
            .entry(key(guild_id, plugin_name))
            .or_default()
            .enabled = Some(enabled);
    }

    /// Stored config, or an empty object when the pair has no record
    pub async fn get_config(&self, guild_id: &str, plugin_name: &str) -> ConfigMap {
        if let Some(store) = self.ready_store() {
            match store.find(guild_id, plugin_name).await {
                Ok(record) => return record.map(|r| r.config).unwrap_or_default(),
                Err(e) => warn!(
                    guild = %guild_id,
                    plugin = %plugin_name,
                    "Failed to read plugin config, using cache: {}",
                    e
                ),
            }
        }

        self.cache
            .read()
            .await
            .get(&key(guild_id, plugin_name))
            .and_then(|entry| entry.config.clone())
            .unwrap_or_default()
    }

    pub async fn set_config(&self, guild_id: &str, plugin_name: &str, config: ConfigMap) {
        if let Some(store) = self.ready_store() {
            match store.set_config(guild_id, plugin_name, &config).await {
                Ok(_) => return,
                Err(e) => warn!(
                    guild = %guild_id,
                    plugin = %plugin_name,
                    "Failed to persist plugin config, keeping it in memory: {}",
                    e
                ),
            }
        }

        self.cache
            .write()
            .await
            .entry(key(guild_id, plugin_name))
            .or_default()
            .config = Some(config);
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn key(guild_id: &str, plugin_name: &str) -> CacheKey {
    (guild_id.to_string(), plugin_name.to_string())
}

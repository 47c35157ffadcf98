use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form plugin configuration for one guild
pub type ConfigMap = Map<String, Value>;

/// Per-(guild, plugin) record held by the durable store.
///
/// A missing record means "use defaults", which is enabled with an empty config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildPluginConfig {
    pub guild_id: String,
    pub plugin_name: String,
    pub enabled: bool,
    pub config: ConfigMap,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GuildPluginConfig {
    pub fn new(guild_id: impl Into<String>, plugin_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            guild_id: guild_id.into(),
            plugin_name: plugin_name.into(),
            enabled: true,
            config: ConfigMap::new(),
            installed_at: now,
            updated_at: now,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.updated_at = Utc::now();
    }

    pub fn set_config(&mut self, config: ConfigMap) {
        self.config = config;
        self.updated_at = Utc::now();
    }
}

/// In-memory stand-in used while the durable store is unreachable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedGuildConfig {
    pub enabled: Option<bool>,
    pub config: Option<ConfigMap>,
}

//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub plugins: PluginConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub token: Option<String>,
    pub application_id: Option<String>,
    /// Publish commands to this guild only instead of globally
    pub guild_id: Option<String>,
    /// User ids allowed to run owner-only commands
    pub owners: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    pub directory: PathBuf,
    pub auto_load: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DatabaseConfig {
    /// SQLite file; without one guild config lives in memory only
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "guildkit".to_string(),
            token: None,
            application_id: None,
            guild_id: None,
            owners: Vec::new(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./plugins"),
            auto_load: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Load `path` if it exists, otherwise defaults; environment overrides apply to both
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn load_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `DISCORD_TOKEN`, `DISCORD_APPLICATION_ID`, `DISCORD_GUILD_ID`,
    /// `OWNER_ID`, `DATABASE_PATH` and `PLUGINS_DIR` as read by `lookup`
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = var("DISCORD_TOKEN") {
            self.bot.token = Some(token);
        }
        if let Some(id) = var("DISCORD_APPLICATION_ID") {
            self.bot.application_id = Some(id);
        }
        if let Some(guild) = var("DISCORD_GUILD_ID") {
            self.bot.guild_id = Some(guild);
        }
        if let Some(owner) = var("OWNER_ID") {
            if !self.bot.owners.contains(&owner) {
                self.bot.owners.push(owner);
            }
        }
        if let Some(path) = var("DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(dir) = var("PLUGINS_DIR") {
            self.plugins.directory = PathBuf::from(dir);
        }
        self
    }

    /// Token, or `MissingField` when none is configured
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.bot
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField("bot.token (or DISCORD_TOKEN)".to_string()))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse("bot:\n  owners: [\"42\"]\ndatabase:\n  path: data/guildkit.db\n").unwrap();
        assert_eq!(config.bot.name, "guildkit");
        assert_eq!(config.bot.owners, vec!["42"]);
        assert_eq!(config.database.path, Some(PathBuf::from("data/guildkit.db")));
        assert_eq!(config.plugins.directory, PathBuf::from("./plugins"));
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("DISCORD_TOKEN", "secret"),
            ("DISCORD_GUILD_ID", "123"),
            ("OWNER_ID", "42"),
            ("PLUGINS_DIR", "/srv/plugins"),
            ("DATABASE_PATH", ""),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.token().unwrap(), "secret");
        assert_eq!(config.bot.guild_id.as_deref(), Some("123"));
        assert_eq!(config.bot.owners, vec!["42"]);
        assert_eq!(config.plugins.directory, PathBuf::from("/srv/plugins"));
        assert_eq!(config.database.path, None);
    }

    #[test]
    fn test_missing_token() {
        let err = Config::default().token().unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn test_yaml_uses_kebab_case() {
        let yaml = Config::default().to_yaml().unwrap();
        assert!(yaml.contains("auto-load"));
        assert!(yaml.contains("application-id"));
    }
}

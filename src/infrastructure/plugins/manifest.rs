//! Plugin manifest definition

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::application::errors::PluginError;

/// File every plugin directory must contain
pub const MANIFEST_FILE: &str = "plugin.yaml";

/// Entry point of a plugin directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    /// Compiled-in factory key; defaults to the directory name
    pub entry: Option<String>,

    /// Native library exporting `_plugin_create`, relative to the plugin directory
    pub library: Option<PathBuf>,
}

impl PluginManifest {
    pub fn from_file(path: impl AsRef<Path>, plugin: &str) -> Result<Self, PluginError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PluginError::invalid(plugin, format!("failed to read manifest: {}", e)))?;
        Self::parse(&content, plugin)
    }

    pub fn parse(content: &str, plugin: &str) -> Result<Self, PluginError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| PluginError::invalid(plugin, format!("failed to parse manifest: {}", e)))
    }

    /// Factory key for a compiled-in plugin living in `directory`
    pub fn entry_key<'a>(&'a self, directory: &'a str) -> &'a str {
        self.entry.as_deref().unwrap_or(directory)
    }
}

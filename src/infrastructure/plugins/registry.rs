//! Plugin registry - Table of loaded plugin instances keyed by name

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use libloading::Library;

use super::loader::LoadedInstance;
use crate::application::errors::PluginError;
use crate::plugins::{Plugin, PluginDescriptor, PluginHost};

/// A plugin that finished loading.
///
/// `instance` is declared before `library` so it is dropped first.
pub struct LoadedPlugin {
    instance: Arc<dyn Plugin>,
    host: PluginHost,
    directory: String,
    _library: Option<Library>,
}

impl LoadedPlugin {
    pub fn new(loaded: LoadedInstance, host: PluginHost, directory: impl Into<String>) -> Self {
        Self {
            instance: Arc::from(loaded.plugin),
            host,
            directory: directory.into(),
            _library: loaded.library,
        }
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.instance.as_ref()
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        self.instance.descriptor()
    }

    pub fn host(&self) -> &PluginHost {
        &self.host
    }

    /// Directory the plugin was loaded from
    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn is_native(&self) -> bool {
        self._library.is_some()
    }
}

/// Registry for managing loaded plugins
pub struct PluginRegistry {
    plugins: RwLock<HashMap<String, Arc<LoadedPlugin>>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            plugins: RwLock::new(HashMap::new()),
        }
    }

    /// Register a loaded plugin under its declared name
    pub fn register(&self, plugin: LoadedPlugin) -> Result<Arc<LoadedPlugin>, PluginError> {
        let name = plugin.descriptor().name.clone();
        let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);

        if plugins.contains_key(&name) {
            return Err(PluginError::AlreadyLoaded(name));
        }

        let plugin = Arc::new(plugin);
        plugins.insert(name, plugin.clone());
        Ok(plugin)
    }

    /// Get a plugin by name
    pub fn get(&self, name: &str) -> Option<Arc<LoadedPlugin>> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Snapshot of every loaded plugin
    pub fn all(&self) -> Vec<Arc<LoadedPlugin>> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Check if a plugin is loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Remove a plugin from the table
    pub fn unload(&self, name: &str) -> Result<Arc<LoadedPlugin>, PluginError> {
        self.plugins
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))
    }

    /// Get the number of loaded plugins
    pub fn len(&self) -> usize {
        self.plugins.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if no plugins are loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Plugin loader - Resolves plugin directories into fresh plugin instances
//!
//! A plugin directory holds a `plugin.yaml`. It either names a compiled-in
//! factory (`entry`) or a native shared library (`library`) exporting
//! `_plugin_create`.

use std::collections::HashMap;
use std::ffi::c_void;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use libloading::Library;
use tracing::{debug, warn};

use super::manifest::{PluginManifest, MANIFEST_FILE};
use crate::application::errors::PluginError;
use crate::plugins::{Plugin, PluginFactory, PluginHost};

/// Symbol type for `_plugin_create(host) -> *mut c_void`
type CreateFn = unsafe extern "C" fn(*const PluginHost) -> *mut c_void;

/// A freshly constructed plugin.
///
/// Drop order matters: `plugin` must be dropped before `library`
/// (Rust drops fields in declaration order).
pub struct LoadedInstance {
    pub plugin: Box<dyn Plugin>,
    pub library: Option<Library>,
}

/// Plugin loader
pub struct PluginLoader {
    plugin_dir: PathBuf,
    factories: HashMap<String, PluginFactory>,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            factories: HashMap::new(),
        }
    }

    /// Make a compiled-in plugin available under `key`
    pub fn with_factory(mut self, key: impl Into<String>, factory: PluginFactory) -> Self {
        self.register_factory(key, factory);
        self
    }

    pub fn register_factory(&mut self, key: impl Into<String>, factory: PluginFactory) {
        self.factories.insert(key.into(), factory);
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Names of every candidate plugin directory, sorted.
    ///
    /// A missing root yields nothing; hidden directories are skipped.
    pub fn discover(&self) -> Result<Vec<String>, PluginError> {
        if !self.plugin_dir.exists() {
            warn!("Plugin directory does not exist: {}", self.plugin_dir.display());
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.plugin_dir).map_err(|e| {
            PluginError::load(
                self.plugin_dir.display().to_string(),
                format!("failed to read plugin directory: {}", e),
            )
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match path.file_name().and_then(|n| n.to_str()) {
                Some(name) if !name.starts_with('.') => names.push(name.to_string()),
                _ => continue,
            }
        }
        names.sort();
        Ok(names)
    }

    /// Construct a fresh instance of the plugin in `directory`
    pub fn load(&self, directory: &str, host: PluginHost) -> Result<LoadedInstance, PluginError> {
        let path = self.plugin_dir.join(directory);
        if !path.is_dir() {
            return Err(PluginError::NotFound(directory.to_string()));
        }

        let manifest_path = path.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return Err(PluginError::NotFound(directory.to_string()));
        }
        let manifest = PluginManifest::from_file(&manifest_path, directory)?;

        if let Some(library) = &manifest.library {
            let library_path = path.join(library);
            if !library_path.exists() {
                return Err(PluginError::NotFound(directory.to_string()));
            }
            return load_library(&library_path, directory, &host);
        }

        let key = manifest.entry_key(directory);
        let factory = self.factories.get(key).ok_or_else(|| {
            PluginError::invalid(directory, format!("no plugin factory named '{}'", key))
        })?;
        debug!(directory = %directory, entry = %key, "Constructing compiled-in plugin");

        Ok(LoadedInstance {
            plugin: factory(host),
            library: None,
        })
    }
}

/// Load a native plugin and call `_plugin_create` with panic isolation
fn load_library(
    path: &Path,
    directory: &str,
    host: &PluginHost,
) -> Result<LoadedInstance, PluginError> {
    let library = unsafe { Library::new(path) }.map_err(|e| {
        PluginError::invalid(directory, format!("failed to load library {}: {}", path.display(), e))
    })?;

    let raw = {
        let create = unsafe { library.get::<CreateFn>(b"_plugin_create\0") }.map_err(|e| {
            PluginError::invalid(directory, format!("symbol _plugin_create not found: {}", e))
        })?;
        catch_unwind(AssertUnwindSafe(|| unsafe { create(host as *const PluginHost) }))
            .map_err(|_| PluginError::invalid(directory, "plugin panicked during _plugin_create"))?
    };

    if raw.is_null() {
        return Err(PluginError::invalid(directory, "_plugin_create returned null"));
    }

    // SAFETY: `_plugin_create` hands over a double-boxed plugin built with the
    // same allocator; nothing fallible runs between here and the return.
    let plugin = unsafe { *Box::from_raw(raw as *mut Box<dyn Plugin>) };

    Ok(LoadedInstance {
        plugin,
        library: Some(library),
    })
}

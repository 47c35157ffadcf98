//! Plugin manager - handles plugin lifecycle, guild state and command publishing

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::host::PluginHost;
use super::trait_def::PluginDescriptor;
use crate::application::errors::{BotError, PluginError};
use crate::application::messaging::{EventRouter, SharedBus};
use crate::application::services::{ConfigStore, SharedCommands};
use crate::domain::entities::{Command, CommandPayload, CommandRegistry, ConfigMap};
use crate::domain::traits::{Bot, CommandCatalog};
use crate::infrastructure::plugins::{LoadedPlugin, PluginLoader, PluginRegistry};

/// Lifecycle state of a plugin directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum PluginState {
    Unloaded,
    Loading,
    Loaded,
    Unloading,
    /// Last load attempt failed; behaves like `Unloaded`
    Failed(String),
}

/// Plugin information for listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginSummary {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub loaded: bool,
}

/// Detailed plugin information, including what it registered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginDetails {
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub directory: String,
    pub dependencies: Vec<String>,
    pub permissions: Vec<String>,
    pub native: bool,
    pub commands: Vec<String>,
    pub events: Vec<String>,
}

/// Manages all plugins for the bot.
///
/// Owns the shared command registry and event router. Load, unload and reload
/// are serialized per plugin directory, and again per declared plugin name
/// once the instance has been constructed.
pub struct PluginManager {
    loader: PluginLoader,
    plugins: PluginRegistry,
    commands: SharedCommands,
    router: Arc<EventRouter>,
    config: Arc<ConfigStore>,
    bot: Arc<dyn Bot>,
    states: Mutex<HashMap<String, PluginState>>,
    lifecycle: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    names: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    is_loaded: AtomicBool,
    published: AtomicBool,
}

impl PluginManager {
    pub fn new(
        loader: PluginLoader,
        config: Arc<ConfigStore>,
        bot: Arc<dyn Bot>,
        bus: SharedBus,
    ) -> Self {
        Self {
            loader,
            plugins: PluginRegistry::new(),
            commands: Arc::new(std::sync::RwLock::new(CommandRegistry::new())),
            router: Arc::new(EventRouter::new(bus)),
            config,
            bot,
            states: Mutex::new(HashMap::new()),
            lifecycle: Mutex::new(HashMap::new()),
            names: Mutex::new(HashMap::new()),
            is_loaded: AtomicBool::new(false),
            published: AtomicBool::new(false),
        }
    }

    pub fn commands(&self) -> &SharedCommands {
        &self.commands
    }

    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    pub fn config_store(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// Load every plugin directory once; later calls do nothing.
    ///
    /// A plugin that fails to load is logged and skipped. Returns how many loaded.
    pub async fn load_all(&self) -> usize {
        if self.is_loaded.swap(true, Ordering::SeqCst) {
            debug!("Plugins already loaded");
            return 0;
        }

        let directories = match self.loader.discover() {
            Ok(dirs) => dirs,
            Err(e) => {
                error!("Failed to discover plugins: {}", e);
                return 0;
            }
        };

        let mut loaded = 0;
        for directory in &directories {
            match self.load_one(directory).await {
                Ok(_) => loaded += 1,
                Err(e) => error!(plugin = %directory, "❌ Failed to load plugin: {}", e),
            }
        }
        info!(
            "Loaded {}/{} plugins from {}",
            loaded,
            directories.len(),
            self.loader.plugin_dir().display()
        );
        loaded
    }

    /// Load the plugin in `directory`
    pub async fn load_one(&self, directory: &str) -> Result<PluginDescriptor, PluginError> {
        let lock = self.lifecycle_lock(directory);
        let _guard = lock.lock().await;
        self.load_locked(directory).await
    }

    /// Unload a plugin by name
    pub async fn unload_one(&self, name: &str) -> Result<(), PluginError> {
        let directory = self.directory_of(name)?;
        let lock = self.lifecycle_lock(&directory);
        let _guard = lock.lock().await;
        self.unload_locked(name).await
    }

    /// Unload then load again from the same directory.
    ///
    /// Not atomic: if the new load fails the plugin stays unloaded.
    pub async fn reload_one(&self, name: &str) -> Result<PluginDescriptor, PluginError> {
        let directory = self.directory_of(name)?;
        let lock = self.lifecycle_lock(&directory);
        let _guard = lock.lock().await;

        self.unload_locked(name).await?;
        let descriptor = self.load_locked(&directory).await?;
        info!(plugin = %descriptor.name, "🔄 Plugin reloaded");
        Ok(descriptor)
    }

    async fn load_locked(&self, directory: &str) -> Result<PluginDescriptor, PluginError> {
        self.set_state(directory, PluginState::Loading);
        match self.construct_and_register(directory).await {
            Ok(descriptor) => {
                self.set_state(directory, PluginState::Loaded);
                info!(
                    plugin = %descriptor.name,
                    version = %descriptor.version,
                    "✅ Plugin loaded"
                );
                Ok(descriptor)
            }
            Err(PluginError::AlreadyLoaded(name)) => {
                let same_directory = self
                    .plugins
                    .get(&name)
                    .is_some_and(|existing| existing.directory() == directory);
                let e = PluginError::AlreadyLoaded(name);
                if same_directory {
                    self.set_state(directory, PluginState::Loaded);
                } else {
                    self.set_state(directory, PluginState::Failed(e.to_string()));
                }
                Err(e)
            }
            Err(e) => {
                self.set_state(directory, PluginState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn construct_and_register(&self, directory: &str) -> Result<PluginDescriptor, PluginError> {
        let host = PluginHost::new(
            directory,
            self.config.clone(),
            self.commands.clone(),
            self.router.clone(),
            self.bot.clone(),
        );
        let loaded = self.loader.load(directory, host.clone())?;

        let descriptor = loaded.plugin.descriptor().clone();
        if let Some(field) = descriptor.missing_identity() {
            return Err(PluginError::invalid(
                directory,
                format!("missing required property '{}'", field),
            ));
        }

        // Held until the instance is in the table so two directories cannot
        // both claim one name.
        let name_lock = self.name_lock(&descriptor.name);
        let _name_guard = name_lock.lock().await;
        if self.plugins.is_loaded(&descriptor.name) {
            return Err(PluginError::AlreadyLoaded(descriptor.name));
        }

        let name = descriptor.name.clone();
        host.bind(descriptor.clone());

        if let Err(e) = loaded.plugin.on_load().await {
            let commands = self.remove_commands_of(&name);
            let listeners = self.router.detach_all(&name);
            debug!(plugin = %name, commands, listeners, "Rolled back partial registration");
            return Err(PluginError::load(name, e.to_string()));
        }

        for command in loaded.plugin.commands() {
            let command_name = command.name.clone();
            if let Err(e) = host.register_slash_command(command) {
                warn!(plugin = %name, command = %command_name, "Skipping invalid command: {}", e);
            }
        }
        for event in loaded.plugin.events() {
            let event_name = event.name.clone();
            if let Err(e) = host.register_event(event) {
                warn!(plugin = %name, event = %event_name, "Skipping invalid event: {}", e);
            }
        }

        if let Err(e) = self.plugins.register(LoadedPlugin::new(loaded, host, directory)) {
            self.remove_commands_of(&name);
            self.router.detach_all(&name);
            return Err(e);
        }
        Ok(descriptor)
    }

    async fn unload_locked(&self, name: &str) -> Result<(), PluginError> {
        let name_lock = self.name_lock(name);
        let _name_guard = name_lock.lock().await;
        let plugin = self
            .plugins
            .get(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        let directory = plugin.directory().to_string();
        self.set_state(&directory, PluginState::Unloading);

        if let Err(e) = plugin.plugin().on_unload().await {
            warn!(plugin = %name, "on_unload failed, continuing teardown: {}", e);
        }

        let commands = self.remove_commands_of(name);
        let listeners = self.router.detach_all(name);
        self.plugins.unload(name)?;
        self.set_state(&directory, PluginState::Unloaded);

        info!(plugin = %name, commands, listeners, "Plugin unloaded");
        Ok(())
    }

    fn remove_commands_of(&self, plugin: &str) -> usize {
        self.commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unregister_all_owned_by(plugin)
    }

    fn directory_of(&self, name: &str) -> Result<String, PluginError> {
        self.plugins
            .get(name)
            .map(|p| p.directory().to_string())
            .ok_or_else(|| PluginError::NotFound(name.to_string()))
    }

    fn lifecycle_lock(&self, directory: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(directory.to_string())
            .or_default()
            .clone()
    }

    fn name_lock(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.names
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    fn set_state(&self, directory: &str, state: PluginState) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(directory.to_string(), state);
    }

    /// Lifecycle state by plugin name or directory
    pub fn state(&self, plugin: &str) -> PluginState {
        let directory = self
            .plugins
            .get(plugin)
            .map(|p| p.directory().to_string())
            .unwrap_or_else(|| plugin.to_string());
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&directory)
            .cloned()
            .unwrap_or(PluginState::Unloaded)
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.plugins.is_loaded(name)
    }

    /// Enable a loaded plugin in a guild
    pub async fn enable(&self, guild_id: &str, name: &str) -> Result<bool, PluginError> {
        self.require_loaded(name)?;
        self.config.set_enabled(guild_id, name, true).await;
        info!(guild = %guild_id, plugin = %name, "Plugin enabled");
        Ok(true)
    }

    /// Disable a loaded plugin in a guild
    pub async fn disable(&self, guild_id: &str, name: &str) -> Result<bool, PluginError> {
        self.require_loaded(name)?;
        self.config.set_enabled(guild_id, name, false).await;
        info!(guild = %guild_id, plugin = %name, "Plugin disabled");
        Ok(true)
    }

    fn require_loaded(&self, name: &str) -> Result<(), PluginError> {
        if self.plugins.is_loaded(name) {
            Ok(())
        } else {
            Err(PluginError::NotLoaded(name.to_string()))
        }
    }

    pub async fn is_enabled(&self, guild_id: &str, name: &str) -> bool {
        self.config.get_enabled(guild_id, name).await
    }

    pub async fn get_config(&self, guild_id: &str, name: &str) -> ConfigMap {
        self.config.get_config(guild_id, name).await
    }

    pub async fn set_config(&self, guild_id: &str, name: &str, config: ConfigMap) {
        self.config.set_config(guild_id, name, config).await
    }

    /// Registration-ordered copy of the merged command namespace
    pub fn command_snapshot(&self) -> Vec<Command> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    /// Push the merged command list to the platform in one bulk call.
    ///
    /// Runs once per manager; later calls are skipped. A failed publish may be retried.
    pub async fn publish_commands(&self, catalog: &dyn CommandCatalog) -> Result<usize, BotError> {
        if self.published.swap(true, Ordering::SeqCst) {
            warn!("Commands already published, skipping");
            return Ok(0);
        }

        let payload: Vec<CommandPayload> = self
            .command_snapshot()
            .iter()
            .map(CommandPayload::from)
            .collect();
        info!("Publishing {} commands", payload.len());

        match catalog.replace_all(&payload).await {
            Ok(count) => {
                info!("✅ Published {} commands", count);
                Ok(count)
            }
            Err(e) => {
                self.published.store(false, Ordering::SeqCst);
                error!("❌ Failed to publish commands: {}", e);
                Err(e)
            }
        }
    }

    /// List all loaded plugins, sorted by name
    pub fn list_plugins(&self) -> Vec<PluginSummary> {
        let mut plugins: Vec<PluginSummary> = self
            .plugins
            .all()
            .iter()
            .map(|plugin| {
                let d = plugin.descriptor();
                PluginSummary {
                    name: d.name.clone(),
                    version: d.version.clone(),
                    description: d.description.clone(),
                    author: d.author.clone(),
                    loaded: true,
                }
            })
            .collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    pub fn get_plugin_info(&self, name: &str) -> Option<PluginDetails> {
        let plugin = self.plugins.get(name)?;
        let d = plugin.descriptor();
        let commands = self
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .owned_by(name);

        Some(PluginDetails {
            name: d.name.clone(),
            version: d.version.clone(),
            description: d.description.clone(),
            author: d.author.clone(),
            directory: plugin.directory().to_string(),
            dependencies: d.dependencies.clone(),
            permissions: d.permissions.iter().map(|p| p.as_str().to_string()).collect(),
            native: plugin.is_native(),
            commands,
            events: self.router.events_of(name),
        })
    }
}

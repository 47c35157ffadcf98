//! Capabilities handed to a plugin when it is constructed

use std::fmt;
use std::sync::{Arc, PoisonError};

use once_cell::sync::OnceCell;
use tracing::warn;

use super::trait_def::PluginDescriptor;
use crate::application::errors::{BotError, PluginError};
use crate::application::messaging::{EventRouter, ListenerId};
use crate::application::services::{ConfigStore, SharedCommands};
use crate::domain::entities::{Command, ConfigMap, EventSpec};
use crate::domain::traits::Bot;

/// Guild config access and command/event registration for one plugin instance.
///
/// Cheap to clone. The manager binds the plugin's identity once it has been
/// validated; registration before that point fails with `NotLoaded`.
#[derive(Clone)]
pub struct PluginHost {
    inner: Arc<HostInner>,
}

struct HostInner {
    directory: String,
    identity: OnceCell<PluginDescriptor>,
    config: Arc<ConfigStore>,
    commands: SharedCommands,
    router: Arc<EventRouter>,
    bot: Arc<dyn Bot>,
}

impl PluginHost {
    pub fn new(
        directory: impl Into<String>,
        config: Arc<ConfigStore>,
        commands: SharedCommands,
        router: Arc<EventRouter>,
        bot: Arc<dyn Bot>,
    ) -> Self {
        Self {
            inner: Arc::new(HostInner {
                directory: directory.into(),
                identity: OnceCell::new(),
                config,
                commands,
                router,
                bot,
            }),
        }
    }

    pub(crate) fn bind(&self, descriptor: PluginDescriptor) {
        if self.inner.identity.set(descriptor).is_err() {
            warn!(directory = %self.inner.directory, "Plugin host already bound");
        }
    }

    /// Plugin directory this instance was loaded from
    pub fn directory(&self) -> &str {
        &self.inner.directory
    }

    /// Bound plugin name, falling back to the directory name
    pub fn plugin_name(&self) -> &str {
        self.inner
            .identity
            .get()
            .map(|d| d.name.as_str())
            .unwrap_or(&self.inner.directory)
    }

    pub fn bot(&self) -> &Arc<dyn Bot> {
        &self.inner.bot
    }

    fn identity(&self) -> Result<&PluginDescriptor, PluginError> {
        self.inner
            .identity
            .get()
            .ok_or_else(|| PluginError::NotLoaded(self.inner.directory.clone()))
    }

    pub async fn get_config(&self, guild_id: &str) -> ConfigMap {
        self.inner.config.get_config(guild_id, self.plugin_name()).await
    }

    /// Validate against the plugin's schema, then store
    pub async fn update_config(&self, guild_id: &str, config: ConfigMap) -> Result<(), BotError> {
        let identity = self.identity()?;
        identity.validate_config(&config)?;
        self.inner.config.set_config(guild_id, &identity.name, config).await;
        Ok(())
    }

    pub async fn is_enabled(&self, guild_id: &str) -> bool {
        self.inner.config.get_enabled(guild_id, self.plugin_name()).await
    }

    /// Stamp the command with this plugin and register it, replacing any
    /// command of the same name
    pub fn register_slash_command(&self, command: Command) -> Result<(), BotError> {
        let identity = self.identity()?;
        let command = command.owned_by(&identity.name, &identity.version);
        let conflict = self
            .inner
            .commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(command)?;

        if let Some(conflict) = conflict {
            warn!(plugin = %identity.name, "⚠️ {}", conflict);
        }
        Ok(())
    }

    pub fn register_event(&self, event: EventSpec) -> Result<ListenerId, BotError> {
        let identity = self.identity()?;
        let handler = event.validate()?;
        Ok(self
            .inner
            .router
            .attach(&identity.name, &event.name, handler, event.once))
    }
}

impl fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginHost")
            .field("directory", &self.inner.directory)
            .field("plugin", &self.inner.identity.get().map(|d| &d.name))
            .finish()
    }
}

//! Wiring of the store, plugin manager, command dispatcher and event bus

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::application::messaging::{EventBus, SharedBus};
use crate::application::services::{CommandService, ConfigStore};
use crate::domain::entities::{BotEvent, Invocation};
use crate::domain::traits::{Bot, Store};
use crate::infrastructure::config::Config;
use crate::infrastructure::database::SqliteStore;
use crate::infrastructure::plugins::PluginLoader;
use crate::plugins::{self, PluginManager};

/// A running guildkit instance, independent of the platform adapter
pub struct App {
    pub manager: Arc<PluginManager>,
    pub commands: CommandService,
    pub bus: SharedBus,
    pub context: Arc<BotContext>,
}

/// Parts an `App` is built from
pub struct AppParts {
    pub loader: PluginLoader,
    pub durable: Option<Arc<dyn Store>>,
    pub bot: Arc<dyn Bot>,
    pub owners: Vec<String>,
    pub auto_load: bool,
}

impl App {
    /// Register the built-in commands, then load plugins so theirs take precedence
    pub async fn start(parts: AppParts) -> Self {
        let store = Arc::new(ConfigStore::new(parts.durable));
        let bus: SharedBus = Arc::new(EventBus::new());
        let manager = Arc::new(PluginManager::new(
            parts.loader,
            store,
            parts.bot.clone(),
            bus.clone(),
        ));

        let commands = CommandService::new(manager.commands().clone());
        commands.register_defaults();

        if parts.auto_load {
            manager.load_all().await;
        }

        let context = Arc::new(BotContext::new(parts.bot, manager.clone()).with_owners(parts.owners));
        Self {
            manager,
            commands,
            bus,
            context,
        }
    }

    /// Build from configuration with the bundled plugins available to manifests
    pub async fn from_config(config: &Config, bot: Arc<dyn Bot>) -> Self {
        let mut loader = PluginLoader::new(&config.plugins.directory);
        for (entry, factory) in plugins::bundled() {
            loader.register_factory(entry, factory);
        }

        Self::start(AppParts {
            loader,
            durable: open_store(config.database.path.as_deref()),
            bot,
            owners: config.bot.owners.clone(),
            auto_load: config.plugins.auto_load,
        })
        .await
    }

    /// Deliver an event to every subscribed plugin, returning how many listeners ran
    pub async fn emit(&self, event: BotEvent) -> usize {
        self.bus.emit(event, self.context.clone()).await
    }

    pub async fn dispatch(&self, invocation: &Invocation) -> Result<(), BotError> {
        self.commands.dispatch(&self.context, invocation).await
    }
}

/// Open the configured database; on failure the config store runs on its cache alone
fn open_store(path: Option<&Path>) -> Option<Arc<dyn Store>> {
    let Some(path) = path else {
        info!("No database configured, guild plugin config is kept in memory");
        return None;
    };
    match SqliteStore::open(path) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!("Failed to open database {}: {}, continuing without it", path.display(), e);
            None
        }
    }
}

//! Shared context handed to every command and event handler

use std::sync::Arc;

use crate::domain::traits::Bot;
use crate::plugins::PluginManager;

/// Collection of data that is shared across commands and events
pub struct BotContext {
    pub bot: Arc<dyn Bot>,
    pub plugins: Arc<PluginManager>,
    /// User ids allowed to run owner-only commands
    pub owners: Vec<String>,
}

impl BotContext {
    pub fn new(bot: Arc<dyn Bot>, plugins: Arc<PluginManager>) -> Self {
        Self {
            bot,
            plugins,
            owners: Vec::new(),
        }
    }

    pub fn with_owners(mut self, owners: Vec<String>) -> Self {
        self.owners = owners;
        self
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owners.iter().any(|owner| owner == user_id)
    }
}

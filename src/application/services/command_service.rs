use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, error, warn};

use super::builtin_commands;
use crate::application::context::BotContext;
use crate::application::errors::{BotError, ValidationError};
use crate::domain::entities::{Command, CommandRegistry, ConflictInfo, Invocation};

/// Registry shared by the plugin manager, the command service and plugin hosts
pub type SharedCommands = Arc<RwLock<CommandRegistry>>;

/// Service for registering and executing commands
#[derive(Clone)]
pub struct CommandService {
    commands: SharedCommands,
}

impl CommandService {
    pub fn new(commands: SharedCommands) -> Self {
        Self { commands }
    }

    pub fn commands(&self) -> &SharedCommands {
        &self.commands
    }

    /// Register a command, logging a warning when it replaces another one
    pub fn register(&self, command: Command) -> Result<Option<ConflictInfo>, ValidationError> {
        let conflict = self
            .commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register(command)?;
        if let Some(conflict) = &conflict {
            warn!("⚠️ {}", conflict);
        }
        Ok(conflict)
    }

    /// Register the built-in management commands.
    ///
    /// Runs before any plugin loads so a plugin command of the same name wins.
    pub fn register_defaults(&self) -> usize {
        let mut registered = 0;
        for command in builtin_commands::all() {
            let name = command.name.clone();
            match self.register(command) {
                Ok(_) => registered += 1,
                Err(e) => warn!(command = %name, "Skipping built-in command: {}", e),
            }
        }
        debug!("Registered {} built-in commands", registered);
        registered
    }

    /// Look up the invoked command and run its handler.
    ///
    /// Handler failures are logged and answered with a generic ephemeral error;
    /// only a failure to reply is returned to the caller.
    pub async fn dispatch(&self, ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        let command = self
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&invocation.command)
            .cloned();

        let Some(command) = command else {
            warn!(command = %invocation.command, "Unknown command");
            return invocation
                .reply_ephemeral(format!("❌ Unknown command: /{}", invocation.command))
                .await;
        };
        let Some(handler) = command.handler.clone() else {
            return invocation
                .reply_ephemeral(format!("❌ Command /{} has no handler", command.name))
                .await;
        };

        debug!(command = %command.name, user = %invocation.user_id, "Executing command");
        if let Err(e) = handler.execute(ctx, invocation).await {
            error!(
                command = %command.name,
                plugin = command.owner_label(),
                "Command failed: {}",
                e
            );
            invocation
                .reply_ephemeral("❌ There was an error while executing this command.")
                .await?;
        }
        Ok(())
    }

    /// One line per registered command
    pub fn get_help(&self) -> String {
        help_text(&self.commands.read().unwrap_or_else(PoisonError::into_inner))
    }
}

pub(crate) fn help_text(registry: &CommandRegistry) -> String {
    let mut help = "Available commands:\n".to_string();
    for cmd in registry.all() {
        help.push_str(&format!("  /{} - {}\n", cmd.name, cmd.description));
    }
    help
}

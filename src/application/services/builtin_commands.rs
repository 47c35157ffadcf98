//! Built-in plugin management commands

use async_trait::async_trait;

use super::command_service::help_text;
use crate::application::context::BotContext;
use crate::application::errors::{BotError, CommandError, PluginError};
use crate::domain::entities::{Command, CommandHandler, CommandOption, Invocation, OptionKind, Permission};

pub fn all() -> Vec<Command> {
    vec![
        Command::new("plugin-list")
            .with_description("List all loaded plugins")
            .with_permissions(Permission::Administrator)
            .with_handler(PluginList),
        Command::new("plugin-info")
            .with_description("Show details about a plugin")
            .with_option(plugin_option())
            .with_permissions(Permission::Administrator)
            .with_handler(PluginInfo),
        Command::new("plugin-enable")
            .with_description("Enable a plugin in this server")
            .with_option(plugin_option())
            .with_permissions(Permission::Administrator)
            .with_dm_permission(false)
            .with_handler(PluginToggle { enable: true }),
        Command::new("plugin-disable")
            .with_description("Disable a plugin in this server")
            .with_option(plugin_option())
            .with_permissions(Permission::Administrator)
            .with_dm_permission(false)
            .with_handler(PluginToggle { enable: false }),
        Command::new("plugin-reload")
            .with_description("Reload a plugin (bot owners only)")
            .with_option(plugin_option())
            .with_permissions(Permission::Administrator)
            .with_handler(PluginReload),
        Command::new("help")
            .with_description("Show available commands")
            .with_handler(Help),
    ]
}

fn plugin_option() -> CommandOption {
    CommandOption::new("plugin", "Plugin name", OptionKind::String).required()
}

/// Reply with the outcome; failures are shown as `❌ <message>`
async fn respond(invocation: &Invocation, outcome: Result<String, BotError>) -> Result<(), BotError> {
    let content = match outcome {
        Ok(message) => message,
        Err(BotError::Command(CommandError::InvalidArgs(message))) => format!("❌ {}", message),
        Err(e) => format!("❌ {}", e),
    };
    invocation.reply_ephemeral(content).await
}

struct PluginList;

#[async_trait]
impl CommandHandler for PluginList {
    async fn execute(&self, ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        let plugins = ctx.plugins.list_plugins();
        if plugins.is_empty() {
            return respond(invocation, Ok("No plugins loaded.".to_string())).await;
        }

        let mut text = format!("📦 Loaded plugins ({})\n", plugins.len());
        for plugin in &plugins {
            text.push_str(&format!(
                "• **{}** v{} - {}\n",
                plugin.name, plugin.version, plugin.description
            ));
        }
        respond(invocation, Ok(text)).await
    }
}

struct PluginInfo;

impl PluginInfo {
    async fn describe(ctx: &BotContext, invocation: &Invocation) -> Result<String, BotError> {
        let name = invocation.required_string("plugin")?;
        let info = ctx
            .plugins
            .get_plugin_info(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        let mut text = format!(
            "📦 **{}** v{}\n{}\nAuthor: {}\n",
            info.name, info.version, info.description, info.author
        );
        let commands = if info.commands.is_empty() {
            "none".to_string()
        } else {
            info.commands.iter().map(|c| format!("/{}", c)).collect::<Vec<_>>().join(", ")
        };
        text.push_str(&format!("Commands: {}\n", commands));
        if !info.events.is_empty() {
            text.push_str(&format!("Events: {}\n", info.events.join(", ")));
        }
        if let Some(guild_id) = &invocation.guild_id {
            let enabled = ctx.plugins.is_enabled(guild_id, &info.name).await;
            text.push_str(&format!(
                "Status: {}",
                if enabled { "✅ enabled" } else { "⛔ disabled" }
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl CommandHandler for PluginInfo {
    async fn execute(&self, ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        respond(invocation, Self::describe(ctx, invocation).await).await
    }
}

struct PluginToggle {
    enable: bool,
}

impl PluginToggle {
    async fn apply(&self, ctx: &BotContext, invocation: &Invocation) -> Result<String, BotError> {
        let guild_id = invocation.require_guild()?;
        let name = invocation.required_string("plugin")?;
        let state = if self.enable { "enabled" } else { "disabled" };

        if ctx.plugins.get_plugin_info(name).is_none() {
            return Err(PluginError::NotLoaded(name.to_string()).into());
        }
        if ctx.plugins.is_enabled(guild_id, name).await == self.enable {
            return Ok(format!("⚠️ Plugin **{}** is already {} in this server.", name, state));
        }

        if self.enable {
            ctx.plugins.enable(guild_id, name).await?;
        } else {
            ctx.plugins.disable(guild_id, name).await?;
        }
        Ok(format!("✅ Plugin **{}** {} in this server.", name, state))
    }
}

#[async_trait]
impl CommandHandler for PluginToggle {
    async fn execute(&self, ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        respond(invocation, self.apply(ctx, invocation).await).await
    }
}

struct PluginReload;

impl PluginReload {
    async fn reload(ctx: &BotContext, invocation: &Invocation) -> Result<String, BotError> {
        if !ctx.is_owner(&invocation.user_id) {
            return Err(BotError::PermissionDenied(
                "only bot owners can reload plugins".to_string(),
            ));
        }
        let name = invocation.required_string("plugin")?;
        let descriptor = ctx.plugins.reload_one(name).await?;
        Ok(format!(
            "🔄 Plugin **{}** v{} reloaded.",
            descriptor.name, descriptor.version
        ))
    }
}

#[async_trait]
impl CommandHandler for PluginReload {
    async fn execute(&self, ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        respond(invocation, Self::reload(ctx, invocation).await).await
    }
}

struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn execute(&self, ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        let text = {
            let commands = ctx.plugins.commands();
            let registry = commands.read().unwrap_or_else(std::sync::PoisonError::into_inner);
            help_text(&registry)
        };
        respond(invocation, Ok(text)).await
    }
}

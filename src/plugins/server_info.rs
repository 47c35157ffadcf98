//! Server info plugin - guild and channel details

use async_trait::async_trait;

use super::host::PluginHost;
use super::trait_def::{Plugin, PluginDescriptor};
use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::domain::entities::{Command, CommandHandler, CommandOption, Invocation, OptionKind};

pub const ENTRY: &str = "server-info";

pub struct ServerInfoPlugin {
    descriptor: PluginDescriptor,
    host: PluginHost,
}

pub fn create(host: PluginHost) -> Box<dyn Plugin> {
    Box::new(ServerInfoPlugin {
        descriptor: PluginDescriptor::new(
            "server-info",
            "1.0.0",
            "Shows details about the server and its channels",
            "guildkit",
        ),
        host,
    })
}

#[async_trait]
impl Plugin for ServerInfoPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("serverinfo")
                .with_description("Show information about this server")
                .with_dm_permission(false)
                .with_handler(ServerInfo {
                    host: self.host.clone(),
                }),
            Command::new("channelinfo")
                .with_description("Show information about a channel")
                .with_option(CommandOption::new(
                    "channel",
                    "Channel to inspect (defaults to this one)",
                    OptionKind::Channel,
                ))
                .with_dm_permission(false)
                .with_handler(ChannelInfo {
                    host: self.host.clone(),
                }),
        ]
    }
}

struct ServerInfo {
    host: PluginHost,
}

#[async_trait]
impl CommandHandler for ServerInfo {
    async fn execute(&self, ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        let guild_id = invocation.require_guild()?;
        if !self.host.is_enabled(guild_id).await {
            return invocation
                .reply_ephemeral("❌ The server-info plugin is disabled in this server.")
                .await;
        }

        let Some(guild) = ctx.bot.guild(guild_id).await else {
            return invocation
                .reply_ephemeral("❌ Could not fetch server information.")
                .await;
        };

        let members = guild
            .member_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        invocation
            .reply(format!(
                "📊 **{}**\n🆔 ID: `{}`\n👑 Owner: <@{}>\n👥 Members: {}",
                guild.name, guild.id, guild.owner_id, members
            ))
            .await
    }
}

struct ChannelInfo {
    host: PluginHost,
}

#[async_trait]
impl CommandHandler for ChannelInfo {
    async fn execute(&self, ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        let guild_id = invocation.require_guild()?;
        if !self.host.is_enabled(guild_id).await {
            return invocation
                .reply_ephemeral("❌ The server-info plugin is disabled in this server.")
                .await;
        }

        let Some(channel_id) = invocation
            .string_option("channel")
            .or(invocation.channel_id.as_deref())
        else {
            return invocation.reply_ephemeral("❌ No channel to inspect.").await;
        };

        match ctx.bot.channel(channel_id).await {
            Some(channel) => {
                invocation
                    .reply(format!(
                        "📋 **{}** <#{}>\n🆔 ID: `{}`\n📝 Type: {}",
                        channel.name, channel.id, channel.id, channel.kind
                    ))
                    .await
            }
            None => {
                invocation
                    .reply_ephemeral(format!("❌ Channel `{}` not found.", channel_id))
                    .await
            }
        }
    }
}

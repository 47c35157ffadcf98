//! Welcome plugin - greets new members in a configured channel

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::host::PluginHost;
use super::trait_def::{FieldSpec, FieldType, Plugin, PluginDescriptor};
use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::domain::entities::event::names;
use crate::domain::entities::{
    BotEvent, Command, CommandHandler, CommandOption, EventHandler, EventSpec, Invocation,
    OptionKind, Permission,
};

pub const ENTRY: &str = "welcome";

const DEFAULT_MESSAGE: &str = "Welcome {user} to **{server}**! 🎉\n\nWe hope you enjoy your stay.";

/// Guild text channel type code
const GUILD_TEXT: u8 = 0;

pub struct WelcomePlugin {
    descriptor: PluginDescriptor,
    host: PluginHost,
}

pub fn create(host: PluginHost) -> Box<dyn Plugin> {
    Box::new(WelcomePlugin::new(host))
}

impl WelcomePlugin {
    pub fn new(host: PluginHost) -> Self {
        let descriptor = PluginDescriptor::new(
            "welcome",
            "1.0.0",
            "Welcome messages for new members",
            "guildkit",
        )
        .with_permission(Permission::SendMessages)
        .with_field(
            "welcomeChannel",
            FieldSpec::required(FieldType::String).with_description("Welcome channel id"),
        )
        .with_field(
            "welcomeMessage",
            FieldSpec::optional(FieldType::String).with_description("Custom welcome message"),
        )
        .with_field(
            "enabledWelcome",
            FieldSpec::optional(FieldType::Boolean)
                .with_description("Whether welcome messages are sent"),
        );

        Self { descriptor, host }
    }
}

#[async_trait]
impl Plugin for WelcomePlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_load(&self) -> Result<(), BotError> {
        self.host.register_event(
            EventSpec::new(names::GUILD_MEMBER_ADD).with_handler(MemberJoin {
                host: self.host.clone(),
            }),
        )?;
        info!(plugin = ENTRY, "Welcome plugin loaded");
        Ok(())
    }

    async fn on_unload(&self) -> Result<(), BotError> {
        info!(plugin = ENTRY, "Welcome plugin unloaded");
        Ok(())
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("welcome-setup")
            .with_description("Configure welcome messages")
            .with_option(
                CommandOption::new(
                    "channel",
                    "Channel where welcome messages are sent",
                    OptionKind::Channel,
                )
                .required()
                .with_channel_types(vec![GUILD_TEXT]),
            )
            .with_option(CommandOption::new(
                "message",
                "Custom message (supports {user}, {server}, {memberCount})",
                OptionKind::String,
            ))
            .with_permissions(Permission::ManageGuild)
            .with_dm_permission(false)
            .with_handler(WelcomeSetup {
                host: self.host.clone(),
            })]
    }
}

/// Fill in `{user}`, `{server}` and `{memberCount}`
pub fn render_message(template: &str, user_id: &str, server: &str, member_count: Option<u64>) -> String {
    let count = member_count.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string());
    template
        .replace("{user}", &format!("<@{}>", user_id))
        .replace("{server}", server)
        .replace("{memberCount}", &count)
}

struct MemberJoin {
    host: PluginHost,
}

#[async_trait]
impl EventHandler for MemberJoin {
    async fn execute(&self, event: &BotEvent, ctx: &BotContext) -> Result<(), BotError> {
        let BotEvent::GuildMemberAdd {
            guild_id,
            user_id,
            user_name,
        } = event
        else {
            return Ok(());
        };

        if !self.host.is_enabled(guild_id).await {
            return Ok(());
        }

        let config = self.host.get_config(guild_id).await;
        if config.get("enabledWelcome").and_then(Value::as_bool) == Some(false) {
            return Ok(());
        }
        let Some(channel_id) = config.get("welcomeChannel").and_then(Value::as_str) else {
            return Ok(());
        };
        if ctx.bot.channel(channel_id).await.is_none() {
            warn!(plugin = ENTRY, guild = %guild_id, "Welcome channel not found: {}", channel_id);
            return Ok(());
        }

        let template = config
            .get("welcomeMessage")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MESSAGE);
        let guild = ctx.bot.guild(guild_id).await;
        let text = render_message(
            template,
            user_id,
            guild.as_ref().map(|g| g.name.as_str()).unwrap_or("the server"),
            guild.as_ref().and_then(|g| g.member_count),
        );

        ctx.bot.send_message(channel_id, &text).await?;
        debug!(plugin = ENTRY, guild = %guild_id, "Welcome message sent for {}", user_name);
        Ok(())
    }
}

struct WelcomeSetup {
    host: PluginHost,
}

#[async_trait]
impl CommandHandler for WelcomeSetup {
    async fn execute(&self, _ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        let guild_id = invocation.require_guild()?;
        if !self.host.is_enabled(guild_id).await {
            return invocation
                .reply_ephemeral(
                    "❌ The welcome plugin is disabled. Use `/plugin-enable welcome` to enable it.",
                )
                .await;
        }

        let channel_id = invocation.required_string("channel")?;
        let custom_message = invocation.string_option("message");

        let mut config = self.host.get_config(guild_id).await;
        config.insert("welcomeChannel".to_string(), Value::from(channel_id));
        config.insert("enabledWelcome".to_string(), Value::Bool(true));
        if let Some(message) = custom_message {
            config.insert("welcomeMessage".to_string(), Value::from(message));
        }

        if let Err(e) = self.host.update_config(guild_id, config).await {
            return invocation
                .reply_ephemeral(format!("❌ Error saving configuration: {}", e))
                .await;
        }

        let mut reply = format!("✅ Welcome messages will be sent to <#{}>.", channel_id);
        if let Some(message) = custom_message {
            reply.push_str("\n\nPreview:\n");
            reply.push_str(&render_message(
                message,
                &invocation.user_id,
                "this server",
                None,
            ));
        }
        invocation.reply_ephemeral(reply).await
    }
}

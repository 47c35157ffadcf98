//! Gateway event handler: platform events onto the bus, slash commands to the dispatcher

use async_trait::async_trait;
use serde_json::Value;
use serenity::all::{
    CommandDataOptionValue, CommandInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, GuildId, Http,
    Interaction, InviteCreateEvent, InviteDeleteEvent, Member, Message, Reaction, ReactionType,
    Ready, User,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::catalog::DiscordCatalog;
use crate::application::context::BotContext;
use crate::application::errors::BotError;
use crate::application::messaging::SharedBus;
use crate::application::services::CommandService;
use crate::domain::entities::{BotEvent, Invocation};
use crate::domain::traits::{CatalogScope, Reply, Responder};

/// Where to publish the command catalog once the gateway is ready
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub token: String,
    pub application_id: Option<String>,
    pub scope: CatalogScope,
}

pub struct DiscordGateway {
    context: Arc<BotContext>,
    commands: CommandService,
    bus: SharedBus,
    publish: Option<PublishSettings>,
}

impl DiscordGateway {
    pub fn new(context: Arc<BotContext>, commands: CommandService, bus: SharedBus) -> Self {
        Self {
            context,
            commands,
            bus,
            publish: None,
        }
    }

    pub fn with_publish(mut self, settings: PublishSettings) -> Self {
        self.publish = Some(settings);
        self
    }

    async fn emit(&self, event: BotEvent) {
        self.bus.emit(event, self.context.clone()).await;
    }

    async fn publish_commands(&self, application_id: String) {
        let Some(settings) = &self.publish else {
            return;
        };
        let application_id = settings.application_id.clone().unwrap_or(application_id);
        let catalog = DiscordCatalog::new(&settings.token, application_id, settings.scope.clone());
        if let Err(e) = self.context.plugins.publish_commands(&catalog).await {
            error!("Failed to publish commands: {}", e);
        }
    }

    async fn handle_command(&self, http: Arc<Http>, command: CommandInteraction) {
        let mut invocation = Invocation::new(
            command.data.name.clone(),
            command.user.id.to_string(),
            Arc::new(DiscordResponder::new(http, command.clone())),
        )
        .in_channel(command.channel_id.to_string())
        .with_user_name(command.user.name.clone());

        if let Some(guild_id) = command.guild_id {
            invocation = invocation.in_guild(guild_id.to_string());
        }
        for option in &command.data.options {
            invocation = invocation.with_option(option.name.clone(), option_value(&option.value));
        }

        if let Err(e) = self.commands.dispatch(&self.context, &invocation).await {
            error!(command = %invocation.command, "Failed to answer command: {}", e);
        }
    }
}

fn option_value(value: &CommandDataOptionValue) -> Value {
    match value {
        CommandDataOptionValue::String(s) => Value::from(s.clone()),
        CommandDataOptionValue::Integer(n) => Value::from(*n),
        CommandDataOptionValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        CommandDataOptionValue::Boolean(b) => Value::Bool(*b),
        CommandDataOptionValue::User(id) => Value::from(id.to_string()),
        CommandDataOptionValue::Channel(id) => Value::from(id.to_string()),
        CommandDataOptionValue::Role(id) => Value::from(id.to_string()),
        CommandDataOptionValue::Mentionable(id) => Value::from(id.to_string()),
        CommandDataOptionValue::Attachment(id) => Value::from(id.to_string()),
        _ => Value::Null,
    }
}

fn emoji_name(emoji: &ReactionType) -> String {
    match emoji {
        ReactionType::Custom { name, .. } => name.clone().unwrap_or("<unknown-emoji>".to_owned()),
        ReactionType::Unicode(s) => s.clone(),
        _ => "<unknown-emoji>".to_owned(),
    }
}

fn reaction_parts(reaction: &Reaction) -> (Option<String>, String, String, Option<String>, String) {
    (
        reaction.guild_id.map(|g| g.to_string()),
        reaction.channel_id.to_string(),
        reaction.message_id.to_string(),
        reaction.user_id.map(|u| u.to_string()),
        emoji_name(&reaction.emoji),
    )
}

#[serenity::async_trait]
impl serenity::all::EventHandler for DiscordGateway {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("✅ Logged in as {} in {} guilds", ready.user.name, ready.guilds.len());
        self.publish_commands(ready.application.id.to_string()).await;
        self.emit(BotEvent::Ready {
            user_name: ready.user.name.clone(),
            guild_count: ready.guilds.len(),
        })
        .await;
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        self.emit(BotEvent::MessageCreate {
            guild_id: msg.guild_id.map(|g| g.to_string()),
            channel_id: msg.channel_id.to_string(),
            author_id: msg.author.id.to_string(),
            author_bot: msg.author.bot,
            content: msg.content.clone(),
        })
        .await;
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        self.emit(BotEvent::GuildMemberAdd {
            guild_id: new_member.guild_id.to_string(),
            user_id: new_member.user.id.to_string(),
            user_name: new_member.user.name.clone(),
        })
        .await;
    }

    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        self.emit(BotEvent::GuildMemberRemove {
            guild_id: guild_id.to_string(),
            user_id: user.id.to_string(),
            user_name: user.name.clone(),
        })
        .await;
    }

    async fn reaction_add(&self, _ctx: Context, add_reaction: Reaction) {
        let (guild_id, channel_id, message_id, user_id, emoji) = reaction_parts(&add_reaction);
        self.emit(BotEvent::MessageReactionAdd {
            guild_id,
            channel_id,
            message_id,
            user_id,
            emoji,
        })
        .await;
    }

    async fn reaction_remove(&self, _ctx: Context, removed_reaction: Reaction) {
        let (guild_id, channel_id, message_id, user_id, emoji) = reaction_parts(&removed_reaction);
        self.emit(BotEvent::MessageReactionRemove {
            guild_id,
            channel_id,
            message_id,
            user_id,
            emoji,
        })
        .await;
    }

    async fn invite_create(&self, _ctx: Context, data: InviteCreateEvent) {
        self.emit(BotEvent::InviteCreate {
            guild_id: data.guild_id.map(|g| g.to_string()),
            channel_id: data.channel_id.to_string(),
            code: data.code.clone(),
            inviter_id: data.inviter.as_ref().map(|u| u.id.to_string()),
        })
        .await;
    }

    async fn invite_delete(&self, _ctx: Context, data: InviteDeleteEvent) {
        self.emit(BotEvent::InviteDelete {
            guild_id: data.guild_id.map(|g| g.to_string()),
            channel_id: data.channel_id.to_string(),
            code: data.code.clone(),
        })
        .await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                self.emit(BotEvent::InteractionCreate {
                    guild_id: command.guild_id.map(|g| g.to_string()),
                    user_id: Some(command.user.id.to_string()),
                    key: command.data.name.clone(),
                })
                .await;
                self.handle_command(ctx.http.clone(), command).await;
            }
            Interaction::Component(component) => {
                self.emit(BotEvent::InteractionCreate {
                    guild_id: component.guild_id.map(|g| g.to_string()),
                    user_id: Some(component.user.id.to_string()),
                    key: component.data.custom_id.clone(),
                })
                .await;
            }
            _ => {}
        }
    }
}

/// Answers one slash command; later replies become follow-ups
pub struct DiscordResponder {
    http: Arc<Http>,
    interaction: CommandInteraction,
    responded: AtomicBool,
}

impl DiscordResponder {
    pub fn new(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self {
            http,
            interaction,
            responded: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Responder for DiscordResponder {
    async fn reply(&self, reply: Reply) -> Result<(), BotError> {
        let http: &Http = &self.http;
        if self.responded.swap(true, Ordering::SeqCst) {
            let followup = CreateInteractionResponseFollowup::new()
                .content(reply.content)
                .ephemeral(reply.ephemeral);
            self.interaction
                .create_followup(http, followup)
                .await
                .map_err(|e| BotError::Network(e.to_string()))?;
            return Ok(());
        }

        let message = CreateInteractionResponseMessage::new()
            .content(reply.content)
            .ephemeral(reply.ephemeral);
        if let Err(e) = self
            .interaction
            .create_response(http, CreateInteractionResponse::Message(message))
            .await
        {
            warn!(command = %self.interaction.data.name, "Interaction response failed: {}", e);
            return Err(BotError::Network(e.to_string()));
        }
        Ok(())
    }
}

//! Outbound Discord calls over the REST API

use async_trait::async_trait;
use serenity::all::{Channel, ChannelId, GuildId, Http};
use std::sync::Arc;
use tracing::debug;

use crate::application::errors::BotError;
use crate::domain::traits::{Bot, BotInfo, ChannelInfo, GuildInfo};

/// Discord bot adapter
pub struct DiscordBot {
    http: Arc<Http>,
    info: BotInfo,
}

impl DiscordBot {
    pub fn new(token: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            http: Arc::new(Http::new(token)),
            info: BotInfo {
                id: "unknown".to_string(),
                name: name.clone(),
                username: name,
            },
        }
    }

    pub fn http(&self) -> Arc<Http> {
        self.http.clone()
    }

    /// Fetch the bot user so `bot_info` reports real ids
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        let user = self
            .http
            .get_current_user()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        self.info = BotInfo {
            id: user.id.to_string(),
            name: self.info.name.clone(),
            username: user.name.clone(),
        };
        Ok(())
    }
}

fn parse_id<T: std::str::FromStr>(kind: &str, id: &str) -> Result<T, BotError> {
    id.parse::<T>()
        .map_err(|_| BotError::Parse(format!("invalid {} id '{}'", kind, id)))
}

#[async_trait]
impl Bot for DiscordBot {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        let channel: ChannelId = parse_id("channel", channel_id)?;
        let http: &Http = &self.http;
        let message = channel
            .say(http, text)
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;
        Ok(message.id.to_string())
    }

    async fn guild(&self, guild_id: &str) -> Option<GuildInfo> {
        let guild: GuildId = parse_id("guild", guild_id).ok()?;
        let http: &Http = &self.http;
        match guild.to_partial_guild_with_counts(http).await {
            Ok(guild) => Some(GuildInfo {
                id: guild.id.to_string(),
                name: guild.name.clone(),
                owner_id: guild.owner_id.to_string(),
                member_count: guild.approximate_member_count,
            }),
            Err(e) => {
                debug!(guild = %guild_id, "Guild lookup failed: {}", e);
                None
            }
        }
    }

    async fn channel(&self, channel_id: &str) -> Option<ChannelInfo> {
        let channel: ChannelId = parse_id("channel", channel_id).ok()?;
        let http: &Http = &self.http;
        let channel = match channel.to_channel(http).await {
            Ok(channel) => channel,
            Err(e) => {
                debug!(channel = %channel_id, "Channel lookup failed: {}", e);
                return None;
            }
        };

        match channel {
            Channel::Guild(channel) => Some(ChannelInfo {
                id: channel.id.to_string(),
                name: channel.name.clone(),
                guild_id: Some(channel.guild_id.to_string()),
                kind: channel.kind.name().to_string(),
            }),
            Channel::Private(channel) => Some(ChannelInfo {
                id: channel.id.to_string(),
                name: channel.name(),
                guild_id: None,
                kind: "dm".to_string(),
            }),
            _ => None,
        }
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

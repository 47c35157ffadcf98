use async_trait::async_trait;
use crate::application::errors::BotError;

/// Bot trait - outbound side of the chat platform plus guild/channel lookups
#[async_trait]
pub trait Bot: Send + Sync {
    /// Send a message to a channel, returning the new message id
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError>;

    /// Look up a guild the bot is in
    async fn guild(&self, guild_id: &str) -> Option<GuildInfo>;

    /// Look up a channel by id
    async fn channel(&self, channel_id: &str) -> Option<ChannelInfo>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Answers a single command invocation
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, reply: Reply) -> Result<(), BotError>;
}

/// Reply to a command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub content: String,
    /// Visible only to the invoking user
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

/// Guild snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub member_count: Option<u64>,
}

/// Channel snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub guild_id: Option<String>,
    pub kind: String,
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::context::BotContext;
use crate::application::errors::{BotError, ValidationError};

/// Platform event identifiers
pub mod names {
    pub const READY: &str = "ready";
    pub const MESSAGE_CREATE: &str = "messageCreate";
    pub const GUILD_MEMBER_ADD: &str = "guildMemberAdd";
    pub const GUILD_MEMBER_REMOVE: &str = "guildMemberRemove";
    pub const MESSAGE_REACTION_ADD: &str = "messageReactionAdd";
    pub const MESSAGE_REACTION_REMOVE: &str = "messageReactionRemove";
    pub const INVITE_CREATE: &str = "inviteCreate";
    pub const INVITE_DELETE: &str = "inviteDelete";
    pub const INTERACTION_CREATE: &str = "interactionCreate";
}

/// An inbound platform event
#[derive(Debug, Clone, PartialEq)]
pub enum BotEvent {
    Ready {
        user_name: String,
        guild_count: usize,
    },
    MessageCreate {
        guild_id: Option<String>,
        channel_id: String,
        author_id: String,
        author_bot: bool,
        content: String,
    },
    GuildMemberAdd {
        guild_id: String,
        user_id: String,
        user_name: String,
    },
    GuildMemberRemove {
        guild_id: String,
        user_id: String,
        user_name: String,
    },
    MessageReactionAdd {
        guild_id: Option<String>,
        channel_id: String,
        message_id: String,
        user_id: Option<String>,
        emoji: String,
    },
    MessageReactionRemove {
        guild_id: Option<String>,
        channel_id: String,
        message_id: String,
        user_id: Option<String>,
        emoji: String,
    },
    InviteCreate {
        guild_id: Option<String>,
        channel_id: String,
        code: String,
        inviter_id: Option<String>,
    },
    InviteDelete {
        guild_id: Option<String>,
        channel_id: String,
        code: String,
    },
    InteractionCreate {
        guild_id: Option<String>,
        user_id: Option<String>,
        /// Command name or component custom id
        key: String,
    },
    /// Application-defined events emitted by plugins
    Custom {
        name: String,
        payload: serde_json::Value,
    },
}

impl BotEvent {
    pub fn name(&self) -> &str {
        match self {
            BotEvent::Ready { .. } => names::READY,
            BotEvent::MessageCreate { .. } => names::MESSAGE_CREATE,
            BotEvent::GuildMemberAdd { .. } => names::GUILD_MEMBER_ADD,
            BotEvent::GuildMemberRemove { .. } => names::GUILD_MEMBER_REMOVE,
            BotEvent::MessageReactionAdd { .. } => names::MESSAGE_REACTION_ADD,
            BotEvent::MessageReactionRemove { .. } => names::MESSAGE_REACTION_REMOVE,
            BotEvent::InviteCreate { .. } => names::INVITE_CREATE,
            BotEvent::InviteDelete { .. } => names::INVITE_DELETE,
            BotEvent::InteractionCreate { .. } => names::INTERACTION_CREATE,
            BotEvent::Custom { name, .. } => name,
        }
    }

    pub fn guild_id(&self) -> Option<&str> {
        match self {
            BotEvent::GuildMemberAdd { guild_id, .. }
            | BotEvent::GuildMemberRemove { guild_id, .. } => Some(guild_id),
            BotEvent::MessageCreate { guild_id, .. }
            | BotEvent::MessageReactionAdd { guild_id, .. }
            | BotEvent::MessageReactionRemove { guild_id, .. }
            | BotEvent::InviteCreate { guild_id, .. }
            | BotEvent::InviteDelete { guild_id, .. }
            | BotEvent::InteractionCreate { guild_id, .. } => guild_id.as_deref(),
            BotEvent::Ready { .. } | BotEvent::Custom { .. } => None,
        }
    }
}

/// Receives events a plugin subscribed to; the shared context comes last
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn execute(&self, event: &BotEvent, ctx: &BotContext) -> Result<(), BotError>;
}

/// An event subscription declared by a plugin
#[derive(Clone)]
pub struct EventSpec {
    pub name: String,
    pub once: bool,
    pub handler: Option<Arc<dyn EventHandler>>,
}

impl EventSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            once: false,
            handler: None,
        }
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: EventHandler + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn with_shared_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn validate(&self) -> Result<Arc<dyn EventHandler>, ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingName { kind: "event" });
        }
        self.handler
            .clone()
            .ok_or_else(|| ValidationError::MissingHandler {
                kind: "event",
                name: self.name.clone(),
            })
    }
}

impl fmt::Debug for EventSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSpec")
            .field("name", &self.name)
            .field("once", &self.once)
            .finish()
    }
}

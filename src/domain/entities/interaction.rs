use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::traits::{Reply, Responder};
use crate::application::errors::{BotError, CommandError};

/// A command invocation received from the platform
#[derive(Clone)]
pub struct Invocation {
    pub command: String,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub user_id: String,
    pub user_name: String,
    pub options: Map<String, Value>,
    responder: Arc<dyn Responder>,
}

impl Invocation {
    pub fn new(
        command: impl Into<String>,
        user_id: impl Into<String>,
        responder: Arc<dyn Responder>,
    ) -> Self {
        Self {
            command: command.into(),
            guild_id: None,
            channel_id: None,
            user_id: user_id.into(),
            user_name: String::new(),
            options: Map::new(),
            responder,
        }
    }

    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    pub fn in_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn string_option(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(Value::as_str)
    }

    pub fn required_string(&self, name: &str) -> Result<&str, CommandError> {
        self.string_option(name)
            .ok_or_else(|| CommandError::InvalidArgs(format!("missing option '{}'", name)))
    }

    /// Guild the command was used in; guild-scoped commands fail in DMs
    pub fn require_guild(&self) -> Result<&str, CommandError> {
        self.guild_id
            .as_deref()
            .ok_or_else(|| CommandError::InvalidArgs("this command only works in a server".to_string()))
    }

    pub async fn reply(&self, content: impl Into<String>) -> Result<(), BotError> {
        self.responder.reply(Reply::public(content)).await
    }

    pub async fn reply_ephemeral(&self, content: impl Into<String>) -> Result<(), BotError> {
        self.responder.reply(Reply::ephemeral(content)).await
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("command", &self.command)
            .field("guild_id", &self.guild_id)
            .field("user_id", &self.user_id)
            .field("options", &self.options)
            .finish()
    }
}

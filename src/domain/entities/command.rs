use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::{Invocation, Permissions};
use crate::application::context::BotContext;
use crate::application::errors::{BotError, ValidationError};

/// Platform rule for chat-input command names
static COMMAND_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-_a-z0-9]{1,32}$").expect("command name pattern is valid"));

/// Executes a command invocation
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(&self, ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError>;
}

/// Option value types understood by the command catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Number,
}

impl From<OptionKind> for u8 {
    fn from(kind: OptionKind) -> u8 {
        match kind {
            OptionKind::String => 3,
            OptionKind::Integer => 4,
            OptionKind::Boolean => 5,
            OptionKind::User => 6,
            OptionKind::Channel => 7,
            OptionKind::Role => 8,
            OptionKind::Number => 10,
        }
    }
}

impl TryFrom<u8> for OptionKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            3 => Ok(OptionKind::String),
            4 => Ok(OptionKind::Integer),
            5 => Ok(OptionKind::Boolean),
            6 => Ok(OptionKind::User),
            7 => Ok(OptionKind::Channel),
            8 => Ok(OptionKind::Role),
            10 => Ok(OptionKind::Number),
            other => Err(format!("unsupported option type {}", other)),
        }
    }
}

/// A single command option
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
    /// Restricts channel options to these channel type codes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub channel_types: Vec<u8>,
}

impl CommandOption {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            channel_types: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_channel_types(mut self, types: Vec<u8>) -> Self {
        self.channel_types = types;
        self
    }
}

/// Represents a bot command
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
    pub default_member_permissions: Option<Permissions>,
    pub dm_permission: Option<bool>,
    pub nsfw: bool,
    pub handler: Option<Arc<dyn CommandHandler>>,
    /// Owning plugin; `None` for built-in commands
    pub plugin: Option<String>,
    pub plugin_version: Option<String>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            options: Vec::new(),
            default_member_permissions: None,
            dm_permission: None,
            nsfw: false,
            handler: None,
            plugin: None,
            plugin_version: None,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn with_option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_permissions(mut self, permissions: impl Into<Permissions>) -> Self {
        self.default_member_permissions = Some(permissions.into());
        self
    }

    pub fn with_dm_permission(mut self, allowed: bool) -> Self {
        self.dm_permission = Some(allowed);
        self
    }

    pub fn nsfw(mut self) -> Self {
        self.nsfw = true;
        self
    }

    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: CommandHandler + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Stamp the owning plugin onto the command
    pub fn owned_by(mut self, plugin: impl Into<String>, version: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self.plugin_version = Some(version.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingName { kind: "command" });
        }
        if !COMMAND_NAME.is_match(&self.name) {
            return Err(ValidationError::InvalidName {
                kind: "command",
                name: self.name.clone(),
            });
        }
        if self.handler.is_none() {
            return Err(ValidationError::MissingHandler {
                kind: "command",
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    pub fn owner_label(&self) -> &str {
        self.plugin.as_deref().unwrap_or("built-in")
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("plugin", &self.plugin)
            .field("options", &self.options.len())
            .finish()
    }
}

/// Previous owner of a command name that was just overwritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictInfo {
    pub name: String,
    pub previous_owner: Option<String>,
    pub new_owner: Option<String>,
}

impl fmt::Display for ConflictInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let new_owner = self.new_owner.as_deref().unwrap_or("built-in");
        match &self.previous_owner {
            Some(previous) => write!(
                f,
                "command '{}' already exists in plugin '{}', overwritten by '{}'",
                self.name, previous, new_owner
            ),
            None => write!(
                f,
                "command '{}' already exists as a built-in command, overwritten by '{}'",
                self.name, new_owner
            ),
        }
    }
}

/// Command registry shared by built-in and plugin commands.
///
/// One entry per name; a later registration replaces the earlier one in place.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command) -> Result<Option<ConflictInfo>, ValidationError> {
        command.validate()?;

        match self.commands.iter_mut().find(|c| c.name == command.name) {
            Some(existing) => {
                let conflict = ConflictInfo {
                    name: command.name.clone(),
                    previous_owner: existing.plugin.clone(),
                    new_owner: command.plugin.clone(),
                };
                *existing = command;
                Ok(Some(conflict))
            }
            None => {
                self.commands.push(command);
                Ok(None)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Remove every command owned by `plugin`; returns how many were removed
    pub fn unregister_all_owned_by(&mut self, plugin: &str) -> usize {
        let before = self.commands.len();
        self.commands
            .retain(|c| c.plugin.as_deref() != Some(plugin));
        before - self.commands.len()
    }

    pub fn owned_by(&self, plugin: &str) -> Vec<String> {
        self.commands
            .iter()
            .filter(|c| c.plugin.as_deref() == Some(plugin))
            .map(|c| c.name.clone())
            .collect()
    }

    /// Registration-ordered copy of every command
    pub fn snapshot(&self) -> Vec<Command> {
        self.commands.clone()
    }

    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Serialized form of a command sent to the platform command catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
    pub default_member_permissions: Option<String>,
    pub dm_permission: bool,
    pub nsfw: bool,
}

impl From<&Command> for CommandPayload {
    fn from(command: &Command) -> Self {
        Self {
            name: command.name.clone(),
            description: command.description.clone(),
            options: command.options.clone(),
            default_member_permissions: command
                .default_member_permissions
                .map(|p| p.to_decimal_string()),
            dm_permission: command.dm_permission.unwrap_or(true),
            nsfw: command.nsfw,
        }
    }
}

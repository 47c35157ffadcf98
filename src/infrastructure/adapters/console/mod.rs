//! Console adapter for development/testing

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::application::errors::BotError;
use crate::domain::entities::CommandPayload;
use crate::domain::traits::{
    Bot, BotInfo, ChannelInfo, CommandCatalog, GuildInfo, Reply, Responder,
};

/// Guild and channel ids used by the console session
pub const CONSOLE_GUILD: &str = "1";
pub const CONSOLE_CHANNEL: &str = "10";
pub const CONSOLE_USER: &str = "100";

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    guilds: RwLock<HashMap<String, GuildInfo>>,
    channels: RwLock<HashMap<String, ChannelInfo>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        let adapter = Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "guildkit".to_string(),
                username: "console".to_string(),
            },
            guilds: RwLock::new(HashMap::new()),
            channels: RwLock::new(HashMap::new()),
        };
        adapter.add_guild(GuildInfo {
            id: CONSOLE_GUILD.to_string(),
            name: "Console".to_string(),
            owner_id: CONSOLE_USER.to_string(),
            member_count: Some(1),
        });
        adapter.add_channel(ChannelInfo {
            id: CONSOLE_CHANNEL.to_string(),
            name: "general".to_string(),
            guild_id: Some(CONSOLE_GUILD.to_string()),
            kind: "text".to_string(),
        });
        adapter
    }

    pub fn add_guild(&self, guild: GuildInfo) {
        self.guilds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(guild.id.clone(), guild);
    }

    pub fn add_channel(&self, channel: ChannelInfo) {
        self.channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(channel.id.clone(), channel);
    }

    pub async fn read_line(&self, prompt: &str) -> Option<String> {
        use std::io::Write;
        print!("{}", prompt);
        std::io::stdout().flush().ok()?;
        let mut input = String::new();
        let read = std::io::stdin().read_line(&mut input).ok()?;
        if read == 0 {
            return None;
        }
        Some(input.trim().to_string())
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        println!("[BOT #{}] {}", channel_id, text);
        Ok("console_msg".to_string())
    }

    async fn guild(&self, guild_id: &str) -> Option<GuildInfo> {
        self.guilds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(guild_id)
            .cloned()
    }

    async fn channel(&self, channel_id: &str) -> Option<ChannelInfo> {
        self.channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(channel_id)
            .cloned()
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

/// Prints command replies to stdout
pub struct ConsoleResponder;

#[async_trait]
impl Responder for ConsoleResponder {
    async fn reply(&self, reply: Reply) -> Result<(), BotError> {
        if reply.ephemeral {
            println!("[BOT (only you)] {}", reply.content);
        } else {
            println!("[BOT] {}", reply.content);
        }
        Ok(())
    }
}

/// Prints the catalog instead of publishing it
pub struct ConsoleCatalog;

#[async_trait]
impl CommandCatalog for ConsoleCatalog {
    async fn replace_all(&self, commands: &[CommandPayload]) -> Result<usize, BotError> {
        let json = serde_json::to_string_pretty(commands)
            .map_err(|e| BotError::Parse(e.to_string()))?;
        println!("{}", json);
        Ok(commands.len())
    }
}

/// One line typed into the console session
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    /// `/name key=value ...`
    Command {
        name: String,
        options: Vec<(String, Value)>,
    },
    /// `!join <user>` simulates a member joining the console guild
    Join(String),
    /// `!leave <user>`
    Leave(String),
    Quit,
    Empty,
    Unknown(String),
}

impl ConsoleInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ConsoleInput::Empty;
        }
        if matches!(line, "quit" | "exit" | "!quit") {
            return ConsoleInput::Quit;
        }

        let mut parts = line.split_whitespace();
        let head = parts.next().unwrap_or_default();

        if let Some(name) = head.strip_prefix('/') {
            let options = parts
                .filter_map(|part| part.split_once('='))
                .map(|(key, value)| (key.to_string(), option_value(value)))
                .collect();
            return ConsoleInput::Command {
                name: name.to_string(),
                options,
            };
        }

        match (head, parts.next()) {
            ("!join", Some(user)) => ConsoleInput::Join(user.to_string()),
            ("!leave", Some(user)) => ConsoleInput::Leave(user.to_string()),
            _ => ConsoleInput::Unknown(line.to_string()),
        }
    }
}

fn option_value(raw: &str) -> Value {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::from(raw),
    }
}

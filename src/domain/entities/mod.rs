//! Domain entities - Core business objects

pub mod command;
pub mod event;
pub mod guild_config;
pub mod interaction;
pub mod permission;

pub use command::{
    Command, CommandHandler, CommandOption, CommandPayload, CommandRegistry, ConflictInfo,
    OptionKind,
};
pub use event::{BotEvent, EventHandler, EventSpec};
pub use guild_config::{CachedGuildConfig, ConfigMap, GuildPluginConfig};
pub use interaction::Invocation;
pub use permission::{Permission, Permissions};

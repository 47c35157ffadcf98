//! guildkit - a plugin platform for Discord bots
//!
//! Plugins contribute slash commands and event listeners; per-guild enablement
//! and configuration live in a durable store with an in-memory fallback.

pub mod app;
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;

pub use app::{App, AppParts};
pub use application::context::BotContext;
pub use application::errors::{BotError, PluginError};
pub use plugins::{Plugin, PluginDescriptor, PluginHost, PluginManager};

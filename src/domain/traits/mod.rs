//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod catalog;
pub mod store;

pub use bot::{Bot, BotInfo, ChannelInfo, GuildInfo, Reply, Responder};
pub use catalog::{CatalogScope, CommandCatalog};
pub use store::{ConnectionState, Store};

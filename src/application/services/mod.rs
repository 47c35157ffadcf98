//! Application services - Command dispatch and guild configuration

pub mod builtin_commands;
pub mod command_service;
pub mod config_store;

pub use command_service::{CommandService, SharedCommands};
pub use config_store::ConfigStore;

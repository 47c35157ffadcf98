//! Plugin system for guildkit
//!
//! Provides the plugin contract, the host capabilities each plugin receives,
//! the manager driving their lifecycle, and the bundled plugins.

pub mod host;
pub mod manager;
pub mod server_info;
pub mod trait_def;
pub mod welcome;

pub use host::PluginHost;
pub use manager::{PluginDetails, PluginManager, PluginState, PluginSummary};
pub use trait_def::{FieldSpec, FieldType, Plugin, PluginDescriptor, PluginFactory};

/// Compiled-in plugins, keyed by the `entry` name used in `plugin.yaml`
pub fn bundled() -> Vec<(&'static str, PluginFactory)> {
    vec![
        (welcome::ENTRY, welcome::create as PluginFactory),
        (server_info::ENTRY, server_info::create as PluginFactory),
    ]
}

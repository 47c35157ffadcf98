//! Plugin discovery for guildkit
//!
//! Each plugin lives in its own directory under the plugins root and is
//! described by a `plugin.yaml` manifest. Loaded instances are kept in the
//! registry under their declared name.

pub mod loader;
pub mod manifest;
pub mod registry;

pub use loader::{LoadedInstance, PluginLoader};
pub use manifest::{PluginManifest, MANIFEST_FILE};
pub use registry::{LoadedPlugin, PluginRegistry};

//! Domain layer - Core business objects and the seams to the outside world
//!
//! This layer contains:
//! - Entities: commands, events, guild plugin configuration, invocations
//! - Traits: abstractions for infrastructure (Bot, Store, CommandCatalog)

pub mod entities;
pub mod traits;

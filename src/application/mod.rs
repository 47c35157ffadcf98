//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: command dispatch, built-in commands, guild configuration
//! - Messaging: the shared event bus and per-plugin event routing
//! - Context: data handed to every command and event handler
//! - Errors: typed errors for every layer

pub mod context;
pub mod errors;
pub mod messaging;
pub mod services;

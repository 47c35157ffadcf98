//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Database/Storage: Durable and in-memory guild plugin config
//! - Plugins: Plugin discovery and loading
//! - Adapters: Platform integrations (Discord, console)

pub mod adapters;
pub mod config;
pub mod database;
pub mod plugins;
pub mod storage;

use async_trait::async_trait;
use crate::application::errors::BotError;
use crate::domain::entities::CommandPayload;

/// Where a command catalog lives on the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogScope {
    Global,
    Guild(String),
}

/// Platform-side command catalog
#[async_trait]
pub trait CommandCatalog: Send + Sync {
    /// Replace every command in the catalog with `commands` in one request
    async fn replace_all(&self, commands: &[CommandPayload]) -> Result<usize, BotError>;
}

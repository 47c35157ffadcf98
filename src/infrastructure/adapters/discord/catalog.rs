//! Discord application command catalog over the REST API

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::application::errors::BotError;
use crate::domain::entities::CommandPayload;
use crate::domain::traits::{CatalogScope, CommandCatalog};

/// Discord API base URL
const API_BASE: &str = "https://discord.com/api/v10";

/// A command as the platform reports it back
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCommand {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

pub struct DiscordCatalog {
    client: Client,
    token: String,
    application_id: String,
    scope: CatalogScope,
}

impl DiscordCatalog {
    pub fn new(token: impl Into<String>, application_id: impl Into<String>, scope: CatalogScope) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            application_id: application_id.into(),
            scope,
        }
    }

    pub fn scope(&self) -> &CatalogScope {
        &self.scope
    }

    /// Ask the platform which application the token belongs to
    pub async fn resolve_application_id(token: &str) -> Result<String, BotError> {
        #[derive(Deserialize)]
        struct Application {
            id: String,
        }

        let response = Client::new()
            .get(format!("{}/applications/@me", API_BASE))
            .header("Authorization", format!("Bot {}", token))
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BotError::Auth("Discord rejected the bot token".to_string()));
        }
        if !response.status().is_success() {
            return Err(BotError::Network(format!("Discord API error: {}", response.status())));
        }

        let application: Application = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        Ok(application.id)
    }

    fn url(&self) -> String {
        catalog_url(&self.application_id, &self.scope)
    }

    /// Commands currently registered in this scope
    pub async fn fetch_all(&self) -> Result<Vec<RemoteCommand>, BotError> {
        let response = self
            .client
            .get(self.url())
            .header("Authorization", format!("Bot {}", self.token))
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::Network(format!("Discord API error: {}", response.status())));
        }

        response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))
    }

    /// Remove every command from this scope
    pub async fn clear(&self) -> Result<(), BotError> {
        self.replace_all(&[]).await.map(|_| ())
    }
}

fn catalog_url(application_id: &str, scope: &CatalogScope) -> String {
    match scope {
        CatalogScope::Global => format!("{}/applications/{}/commands", API_BASE, application_id),
        CatalogScope::Guild(guild_id) => format!(
            "{}/applications/{}/guilds/{}/commands",
            API_BASE, application_id, guild_id
        ),
    }
}

#[async_trait]
impl CommandCatalog for DiscordCatalog {
    async fn replace_all(&self, commands: &[CommandPayload]) -> Result<usize, BotError> {
        let response = self
            .client
            .put(self.url())
            .header("Authorization", format!("Bot {}", self.token))
            .json(commands)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Network(format!("Discord API error: {} {}", status, body)));
        }

        let registered: Vec<Value> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        info!(scope = ?self.scope, "Published {} application commands", registered.len());
        Ok(registered.len())
    }
}

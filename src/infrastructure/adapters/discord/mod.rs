//! Discord adapter built on serenity

pub mod bot;
pub mod catalog;
pub mod gateway;

pub use bot::DiscordBot;
pub use catalog::{DiscordCatalog, RemoteCommand};
pub use gateway::{DiscordGateway, DiscordResponder, PublishSettings};

use serenity::all::GatewayIntents;
use serenity::Client;

use crate::application::errors::BotError;

/// Gateway intents for every event the bus carries
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::GUILD_INVITES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

/// Connect to the gateway and run until the connection ends
pub async fn run(token: &str, gateway: DiscordGateway) -> Result<(), BotError> {
    let mut client = Client::builder(token, intents())
        .event_handler(gateway)
        .await
        .map_err(|e| BotError::Network(e.to_string()))?;

    client
        .start()
        .await
        .map_err(|e| BotError::Network(e.to_string()))
}

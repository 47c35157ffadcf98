use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info, warn};

use guildkit::app::App;
use guildkit::application::errors::BotError;
use guildkit::domain::entities::{BotEvent, Invocation};
use guildkit::domain::traits::{Bot, CatalogScope};
use guildkit::infrastructure::adapters::console::{
    ConsoleAdapter, ConsoleCatalog, ConsoleInput, ConsoleResponder, CONSOLE_CHANNEL,
    CONSOLE_GUILD, CONSOLE_USER,
};
use guildkit::infrastructure::adapters::discord::{
    self, DiscordBot, DiscordCatalog, DiscordGateway, PublishSettings,
};
use guildkit::infrastructure::config::Config;

#[derive(Parser)]
#[command(name = "guildkit")]
#[command(about = "A plugin platform for Discord bots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and start the bot
    Run,
    /// Run against the console for local development
    Console,
    /// Manage the published slash commands
    Deploy {
        #[command(subcommand)]
        target: DeployTarget,
    },
    /// Print the commands that would be published
    Commands,
    /// Generate default config
    InitConfig,
    /// Show version
    Version,
}

#[derive(Subcommand)]
enum DeployTarget {
    /// Publish every command globally
    Global,
    /// Publish every command to one guild
    Guild { guild_id: String },
    /// Remove every command, globally or from one guild
    Clear { guild_id: Option<String> },
    /// List the commands the platform currently has
    List { guild_id: Option<String> },
}

fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        }
    };
    if let Some(token) = cli.token {
        config.bot.token = Some(token);
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.filter)),
        )
        .init();

    let code = match cli.command {
        Commands::Run => run_bot(config),
        Commands::Console => with_runtime(run_console(config)),
        Commands::Deploy { target } => with_runtime(deploy(config, target)),
        Commands::Commands => with_runtime(print_commands(config)),
        Commands::InitConfig => init_config(),
        Commands::Version => {
            println!("guildkit v{}", env!("CARGO_PKG_VERSION"));
            0
        }
    };
    std::process::exit(code);
}

fn with_runtime(task: impl std::future::Future<Output = i32>) -> i32 {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(task),
        Err(e) => {
            eprintln!("❌ Failed to start async runtime: {}", e);
            1
        }
    }
}

fn require_token(config: &Config) -> Option<String> {
    match config.token() {
        Ok(token) => Some(token.to_string()),
        Err(e) => {
            eprintln!("❌ {}", e);
            None
        }
    }
}

fn run_bot(config: Config) -> i32 {
    let Some(token) = require_token(&config) else {
        return 1;
    };

    with_runtime(async move {
        info!("Starting guildkit: {}", config.bot.name);

        let mut bot = DiscordBot::new(&token, &config.bot.name);
        if let Err(e) = bot.fetch_bot_info().await {
            warn!("Could not fetch bot user: {}", e);
        }

        let app = App::from_config(&config, Arc::new(bot)).await;
        info!(
            "Plugin system initialized with {} plugins",
            app.manager.list_plugins().len()
        );

        let gateway = DiscordGateway::new(app.context.clone(), app.commands.clone(), app.bus.clone())
            .with_publish(PublishSettings {
                token: token.clone(),
                application_id: config.bot.application_id.clone(),
                scope: scope_of(config.bot.guild_id.clone()),
            });

        match discord::run(&token, gateway).await {
            Ok(()) => 0,
            Err(e) => {
                error!("Gateway stopped: {}", e);
                1
            }
        }
    })
}

fn scope_of(guild_id: Option<String>) -> CatalogScope {
    match guild_id {
        Some(guild_id) => CatalogScope::Guild(guild_id),
        None => CatalogScope::Global,
    }
}

async fn catalog_for(config: &Config, token: &str, scope: CatalogScope) -> Result<DiscordCatalog, BotError> {
    let application_id = match &config.bot.application_id {
        Some(id) => id.clone(),
        None => DiscordCatalog::resolve_application_id(token).await?,
    };
    Ok(DiscordCatalog::new(token, application_id, scope))
}

async fn deploy(config: Config, target: DeployTarget) -> i32 {
    let Some(token) = require_token(&config) else {
        return 1;
    };

    let scope = match &target {
        DeployTarget::Global => CatalogScope::Global,
        DeployTarget::Guild { guild_id } => CatalogScope::Guild(guild_id.clone()),
        DeployTarget::Clear { guild_id } | DeployTarget::List { guild_id } => {
            scope_of(guild_id.clone())
        }
    };
    let catalog = match catalog_for(&config, &token, scope).await {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("❌ {}", e);
            return 1;
        }
    };

    let result = match target {
        DeployTarget::Global | DeployTarget::Guild { .. } => {
            let bot: Arc<dyn Bot> = Arc::new(DiscordBot::new(&token, &config.bot.name));
            let app = App::from_config(&config, bot).await;
            app.manager
                .publish_commands(&catalog)
                .await
                .map(|count| println!("✅ Published {} commands ({:?})", count, catalog.scope()))
        }
        DeployTarget::Clear { .. } => catalog
            .clear()
            .await
            .map(|()| println!("✅ Cleared commands ({:?})", catalog.scope())),
        DeployTarget::List { .. } => catalog.fetch_all().await.map(|commands| {
            println!("{} commands ({:?})", commands.len(), catalog.scope());
            for command in commands {
                println!("  /{} ({}) - {}", command.name, command.id, command.description);
            }
        }),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("❌ {}", e);
            1
        }
    }
}

async fn print_commands(config: Config) -> i32 {
    let app = App::from_config(&config, Arc::new(ConsoleAdapter::new())).await;
    match app.manager.publish_commands(&ConsoleCatalog).await {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("❌ {}", e);
            1
        }
    }
}

async fn run_console(mut config: Config) -> i32 {
    if !config.bot.owners.iter().any(|o| o == CONSOLE_USER) {
        config.bot.owners.push(CONSOLE_USER.to_string());
    }

    let adapter = Arc::new(ConsoleAdapter::new());
    let app = App::from_config(&config, adapter.clone()).await;
    app.emit(BotEvent::Ready {
        user_name: adapter.bot_info().username,
        guild_count: 1,
    })
    .await;

    println!("guildkit console. Type /help, !join <user>, !leave <user> or quit.");
    while let Some(line) = adapter.read_line("> ").await {
        match ConsoleInput::parse(&line) {
            ConsoleInput::Command { name, options } => {
                let mut invocation = Invocation::new(name, CONSOLE_USER, Arc::new(ConsoleResponder))
                    .in_guild(CONSOLE_GUILD)
                    .in_channel(CONSOLE_CHANNEL)
                    .with_user_name("console");
                for (key, value) in options {
                    invocation = invocation.with_option(key, value);
                }
                if let Err(e) = app.dispatch(&invocation).await {
                    error!("Command failed: {}", e);
                }
            }
            ConsoleInput::Join(user) => {
                app.emit(BotEvent::GuildMemberAdd {
                    guild_id: CONSOLE_GUILD.to_string(),
                    user_id: user.clone(),
                    user_name: user,
                })
                .await;
            }
            ConsoleInput::Leave(user) => {
                app.emit(BotEvent::GuildMemberRemove {
                    guild_id: CONSOLE_GUILD.to_string(),
                    user_id: user.clone(),
                    user_name: user,
                })
                .await;
            }
            ConsoleInput::Quit => break,
            ConsoleInput::Empty => {}
            ConsoleInput::Unknown(line) => println!("Unknown input: {}", line),
        }
    }
    0
}

fn init_config() -> i32 {
    match Config::default().to_yaml() {
        Ok(yaml) => {
            println!("{}", yaml);
            0
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            1
        }
    }
}

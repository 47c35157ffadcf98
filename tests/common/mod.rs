//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use guildkit::app::{App, AppParts};
use guildkit::application::context::BotContext;
use guildkit::application::errors::{BotError, StorageError};
use guildkit::domain::entities::{
    BotEvent, Command, CommandHandler, CommandPayload, ConfigMap, EventHandler, EventSpec,
    GuildPluginConfig, Invocation,
};
use guildkit::domain::traits::{
    Bot, BotInfo, ChannelInfo, CommandCatalog, ConnectionState, GuildInfo, Reply, Responder,
    Store,
};
use guildkit::infrastructure::plugins::{PluginLoader, MANIFEST_FILE};
use guildkit::plugins::{self, Plugin, PluginDescriptor, PluginHost};

pub const GUILD: &str = "500";
pub const CHANNEL: &str = "600";
pub const OWNER: &str = "42";

static INIT: Once = Once::new();

pub fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Chat client that records outgoing messages and knows one guild and channel
pub struct RecordingBot {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingBot {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts_to(&self, channel: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, text)| text)
            .collect()
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn send_message(&self, channel_id: &str, text: &str) -> Result<String, BotError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((channel_id.to_string(), text.to_string()));
        Ok(sent.len().to_string())
    }

    async fn guild(&self, guild_id: &str) -> Option<GuildInfo> {
        (guild_id == GUILD).then(|| GuildInfo {
            id: GUILD.to_string(),
            name: "Rustaceans".to_string(),
            owner_id: OWNER.to_string(),
            member_count: Some(3),
        })
    }

    async fn channel(&self, channel_id: &str) -> Option<ChannelInfo> {
        (channel_id == CHANNEL).then(|| ChannelInfo {
            id: CHANNEL.to_string(),
            name: "welcome".to_string(),
            guild_id: Some(GUILD.to_string()),
            kind: "text".to_string(),
        })
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: "1".to_string(),
            name: "guildkit".to_string(),
            username: "guildkit".to_string(),
        }
    }
}

/// Catalog that records every bulk replace call
#[derive(Default)]
pub struct RecordingCatalog {
    pub calls: Mutex<Vec<Vec<CommandPayload>>>,
    pub fail: bool,
}

impl RecordingCatalog {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<Vec<CommandPayload>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandCatalog for RecordingCatalog {
    async fn replace_all(&self, commands: &[CommandPayload]) -> Result<usize, BotError> {
        self.calls.lock().unwrap().push(commands.to_vec());
        if self.fail {
            return Err(BotError::Network("catalog unreachable".to_string()));
        }
        Ok(commands.len())
    }
}

/// Responder that keeps every reply
#[derive(Default)]
pub struct RecordingResponder {
    pub replies: Mutex<Vec<Reply>>,
}

impl RecordingResponder {
    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }

    pub fn last(&self) -> Reply {
        self.replies().pop().expect("no reply was sent")
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn reply(&self, reply: Reply) -> Result<(), BotError> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }
}

/// Invocation from `user` in the test guild, with its responder
pub fn invoke(command: &str, user: &str) -> (Invocation, Arc<RecordingResponder>) {
    let responder = Arc::new(RecordingResponder::default());
    let invocation = Invocation::new(command, user, responder.clone())
        .in_guild(GUILD)
        .in_channel(CHANNEL)
        .with_user_name("tester");
    (invocation, responder)
}

/// Test plugin: a `/foo` command and a `ping` listener, both labelled
pub struct LabelPlugin {
    descriptor: PluginDescriptor,
    label: &'static str,
    fail_on_load: bool,
    host: PluginHost,
}

#[async_trait]
impl Plugin for LabelPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_load(&self) -> Result<(), BotError> {
        if self.fail_on_load {
            self.host.register_slash_command(
                Command::new("half-registered").with_handler(Echo { label: self.label }),
            )?;
            return Err(BotError::Internal("on_load exploded".to_string()));
        }
        Ok(())
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("foo")
            .with_description(format!("foo from {}", self.label))
            .with_handler(Echo { label: self.label })]
    }

    fn events(&self) -> Vec<EventSpec> {
        vec![EventSpec::new("ping").with_handler(Record { label: self.label })]
    }
}

struct Echo {
    label: &'static str,
}

#[async_trait]
impl CommandHandler for Echo {
    async fn execute(&self, _ctx: &BotContext, invocation: &Invocation) -> Result<(), BotError> {
        invocation.reply(format!("foo from {}", self.label)).await
    }
}

/// Writes the label to the `log` channel so ordering is observable
struct Record {
    label: &'static str,
}

#[async_trait]
impl EventHandler for Record {
    async fn execute(&self, _event: &BotEvent, ctx: &BotContext) -> Result<(), BotError> {
        ctx.bot.send_message("log", self.label).await?;
        Ok(())
    }
}

fn label_plugin(host: PluginHost, name: &str, label: &'static str, fail_on_load: bool) -> Box<dyn Plugin> {
    Box::new(LabelPlugin {
        descriptor: PluginDescriptor::new(name, "1.0.0", "Test plugin", "tests"),
        label,
        fail_on_load,
        host,
    })
}

pub fn alpha(host: PluginHost) -> Box<dyn Plugin> {
    label_plugin(host, "alpha", "alpha", false)
}

pub fn beta(host: PluginHost) -> Box<dyn Plugin> {
    label_plugin(host, "beta", "beta", false)
}

pub fn exploding(host: PluginHost) -> Box<dyn Plugin> {
    label_plugin(host, "exploding", "exploding", true)
}

/// Identity without a description
pub fn anonymous(host: PluginHost) -> Box<dyn Plugin> {
    Box::new(LabelPlugin {
        descriptor: PluginDescriptor::new("anonymous", "1.0.0", "", "tests"),
        label: "anonymous",
        fail_on_load: false,
        host,
    })
}

/// Declares the name `twin` and takes a while to load, so two directories
/// holding a twin can race for the name
pub struct TwinPlugin {
    descriptor: PluginDescriptor,
    label: &'static str,
}

#[async_trait]
impl Plugin for TwinPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_load(&self) -> Result<(), BotError> {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("dup")
            .with_description(format!("dup from {}", self.label))
            .with_handler(Echo { label: self.label })]
    }

    fn events(&self) -> Vec<EventSpec> {
        vec![EventSpec::new("ping").with_handler(Record { label: self.label })]
    }
}

pub fn twin_first(_host: PluginHost) -> Box<dyn Plugin> {
    Box::new(TwinPlugin {
        descriptor: PluginDescriptor::new("twin", "1.0.0", "Twin plugin", "tests"),
        label: "first",
    })
}

pub fn twin_second(_host: PluginHost) -> Box<dyn Plugin> {
    Box::new(TwinPlugin {
        descriptor: PluginDescriptor::new("twin", "1.0.0", "Twin plugin", "tests"),
        label: "second",
    })
}

/// Registers normally but fails to clean up on unload
pub struct StubbornPlugin {
    descriptor: PluginDescriptor,
}

#[async_trait]
impl Plugin for StubbornPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_unload(&self) -> Result<(), BotError> {
        Err(BotError::Internal("on_unload exploded".to_string()))
    }

    fn commands(&self) -> Vec<Command> {
        vec![Command::new("stubborn").with_handler(Echo { label: "stubborn" })]
    }

    fn events(&self) -> Vec<EventSpec> {
        vec![EventSpec::new("ping").with_handler(Record { label: "stubborn" })]
    }
}

pub fn stubborn(_host: PluginHost) -> Box<dyn Plugin> {
    Box::new(StubbornPlugin {
        descriptor: PluginDescriptor::new("stubborn", "1.0.0", "Test plugin", "tests"),
    })
}

/// Declares valid entries next to invalid ones
pub struct SloppyPlugin {
    descriptor: PluginDescriptor,
}

#[async_trait]
impl Plugin for SloppyPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn commands(&self) -> Vec<Command> {
        vec![
            Command::new("Bad Name").with_handler(Echo { label: "sloppy" }),
            Command::new("no-handler"),
            Command::new("tidy").with_handler(Echo { label: "sloppy" }),
        ]
    }

    fn events(&self) -> Vec<EventSpec> {
        vec![
            EventSpec::new("ping"),
            EventSpec::new("").with_handler(Record { label: "nameless" }),
            EventSpec::new("ping").with_handler(Record { label: "sloppy" }),
        ]
    }
}

pub fn sloppy(_host: PluginHost) -> Box<dyn Plugin> {
    Box::new(SloppyPlugin {
        descriptor: PluginDescriptor::new("sloppy", "1.0.0", "Test plugin", "tests"),
    })
}

/// Waits for the next `ping` with a one-shot listener attached during `on_load`
pub struct WatcherPlugin {
    descriptor: PluginDescriptor,
    host: PluginHost,
}

#[async_trait]
impl Plugin for WatcherPlugin {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn on_load(&self) -> Result<(), BotError> {
        self.host
            .register_event(EventSpec::new("ping").once().with_handler(Record { label: "watcher" }))?;
        Ok(())
    }
}

pub fn watcher(host: PluginHost) -> Box<dyn Plugin> {
    Box::new(WatcherPlugin {
        descriptor: PluginDescriptor::new("watcher", "1.0.0", "Test plugin", "tests"),
        host,
    })
}

/// Store that claims to be connected but fails every call
pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    fn state(&self) -> ConnectionState {
        ConnectionState::Connected
    }

    async fn find(
        &self,
        _guild_id: &str,
        _plugin_name: &str,
    ) -> Result<Option<GuildPluginConfig>, StorageError> {
        Err(StorageError::Database("disk I/O error".to_string()))
    }

    async fn set_enabled(
        &self,
        _guild_id: &str,
        _plugin_name: &str,
        _enabled: bool,
    ) -> Result<GuildPluginConfig, StorageError> {
        Err(StorageError::Database("disk I/O error".to_string()))
    }

    async fn set_config(
        &self,
        _guild_id: &str,
        _plugin_name: &str,
        _config: &ConfigMap,
    ) -> Result<GuildPluginConfig, StorageError> {
        Err(StorageError::Database("disk I/O error".to_string()))
    }
}

/// Plugins root with one directory per `(directory, entry)` pair
pub fn plugin_root(plugins: &[(&str, &str)]) -> TempDir {
    let root = tempfile::tempdir().unwrap();
    for (directory, entry) in plugins {
        add_plugin(root.path(), directory, entry);
    }
    root
}

pub fn add_plugin(root: &Path, directory: &str, entry: &str) {
    let dir = root.join(directory);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(MANIFEST_FILE), format!("entry: {}\n", entry)).unwrap();
}

pub fn test_loader(root: &Path) -> PluginLoader {
    let mut loader = PluginLoader::new(root)
        .with_factory("alpha", alpha)
        .with_factory("beta", beta)
        .with_factory("exploding", exploding)
        .with_factory("anonymous", anonymous)
        .with_factory("twin-first", twin_first)
        .with_factory("twin-second", twin_second)
        .with_factory("stubborn", stubborn)
        .with_factory("sloppy", sloppy)
        .with_factory("watcher", watcher);
    for (entry, factory) in plugins::bundled() {
        loader.register_factory(entry, factory);
    }
    loader
}

/// Start an app over `root`, loading every plugin in it
pub async fn start_app(root: &Path, durable: Option<Arc<dyn Store>>) -> (App, Arc<RecordingBot>) {
    build_app(root, durable, true).await
}

/// Start an app over `root` without loading anything
pub async fn start_idle_app(root: &Path) -> (App, Arc<RecordingBot>) {
    build_app(root, None, false).await
}

async fn build_app(
    root: &Path,
    durable: Option<Arc<dyn Store>>,
    auto_load: bool,
) -> (App, Arc<RecordingBot>) {
    ensure_init();
    let bot = Arc::new(RecordingBot::new());
    let app = App::start(AppParts {
        loader: test_loader(root),
        durable,
        bot: bot.clone(),
        owners: vec![OWNER.to_string()],
        auto_load,
    })
    .await;
    (app, bot)
}

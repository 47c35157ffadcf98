//! Plugin lifecycle, command namespace and event delivery
//! Run with: cargo test --test plugin_lifecycle_test

mod common;

use std::sync::PoisonError;

use common::*;
use guildkit::application::errors::PluginError;
use guildkit::domain::entities::BotEvent;
use guildkit::plugins::PluginState;

fn ping() -> BotEvent {
    BotEvent::Custom {
        name: "ping".to_string(),
        payload: serde_json::Value::Null,
    }
}

#[tokio::test]
async fn test_incomplete_identity_is_rejected() {
    let root = plugin_root(&[("alpha", "alpha"), ("anonymous", "anonymous")]);
    let (app, _bot) = start_app(root.path(), None).await;

    assert!(app.manager.is_loaded("alpha"));
    assert!(!app.manager.is_loaded("anonymous"));
    assert_eq!(app.manager.list_plugins().len(), 1);
    assert!(matches!(app.manager.state("anonymous"), PluginState::Failed(_)));

    let err = app.manager.load_one("anonymous").await.unwrap_err();
    assert!(matches!(err, PluginError::Invalid { .. }));
    assert!(err.to_string().contains("description"));
    assert_eq!(app.manager.list_plugins().len(), 1);
}

#[tokio::test]
async fn test_missing_directory_is_not_found() {
    let root = plugin_root(&[]);
    let (app, _bot) = start_app(root.path(), None).await;

    let err = app.manager.load_one("ghost").await.unwrap_err();
    assert!(matches!(err, PluginError::NotFound(_)));
    assert!(matches!(
        app.manager.unload_one("ghost").await,
        Err(PluginError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_loading_twice_is_rejected() {
    let root = plugin_root(&[("alpha", "alpha")]);
    let (app, _bot) = start_app(root.path(), None).await;

    let err = app.manager.load_one("alpha").await.unwrap_err();
    assert!(matches!(err, PluginError::AlreadyLoaded(_)));
    assert!(app.manager.is_loaded("alpha"));
    assert_eq!(app.manager.state("alpha"), PluginState::Loaded);
}

#[tokio::test]
async fn test_unload_removes_commands_and_info() {
    let root = plugin_root(&[("alpha", "alpha")]);
    let (app, bot) = start_app(root.path(), None).await;
    assert!(app.manager.get_plugin_info("alpha").is_some());

    app.manager.unload_one("alpha").await.unwrap();

    assert!(app.manager.get_plugin_info("alpha").is_none());
    assert_eq!(app.manager.state("alpha"), PluginState::Unloaded);
    let commands = app.manager.commands().read().unwrap_or_else(PoisonError::into_inner);
    assert!(commands.get("foo").is_none());
    drop(commands);

    assert_eq!(app.emit(ping()).await, 0);
    assert!(bot.texts_to("log").is_empty());
}

#[tokio::test]
async fn test_reload_is_not_atomic() {
    let root = plugin_root(&[("alpha", "alpha")]);
    let (app, _bot) = start_app(root.path(), None).await;

    let descriptor = app.manager.reload_one("alpha").await.unwrap();
    assert_eq!(descriptor.name, "alpha");
    assert!(app.manager.is_loaded("alpha"));

    std::fs::remove_file(root.path().join("alpha").join("plugin.yaml")).unwrap();
    let err = app.manager.reload_one("alpha").await.unwrap_err();

    assert!(matches!(err, PluginError::NotFound(_)));
    assert!(!app.manager.is_loaded("alpha"));
    assert!(app.manager.get_plugin_info("alpha").is_none());
    assert!(matches!(app.manager.state("alpha"), PluginState::Failed(_)));
}

#[tokio::test]
async fn test_failed_on_load_rolls_back_registrations() {
    let root = plugin_root(&[("exploding", "exploding")]);
    let (app, _bot) = start_app(root.path(), None).await;

    assert!(!app.manager.is_loaded("exploding"));
    let commands = app.manager.commands().read().unwrap_or_else(PoisonError::into_inner);
    assert!(commands.get("half-registered").is_none());
    assert!(commands.get("foo").is_none());
    drop(commands);
    assert!(app.manager.router().events_of("exploding").is_empty());
}

#[tokio::test]
async fn test_last_plugin_wins_command_name() {
    let root = plugin_root(&[("alpha", "alpha"), ("beta", "beta")]);
    let (app, _bot) = start_app(root.path(), None).await;

    let foo: Vec<_> = app
        .manager
        .command_snapshot()
        .into_iter()
        .filter(|c| c.name == "foo")
        .collect();
    assert_eq!(foo.len(), 1);
    assert_eq!(foo[0].plugin.as_deref(), Some("beta"));

    let catalog = RecordingCatalog::default();
    app.manager.publish_commands(&catalog).await.unwrap();

    let calls = catalog.calls();
    assert_eq!(calls.len(), 1);
    let published: Vec<_> = calls[0].iter().filter(|c| c.name == "foo").collect();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].description, "foo from beta");
    assert!(calls[0].iter().any(|c| c.name == "plugin-list"));

    let (invocation, responder) = invoke("foo", "7");
    app.dispatch(&invocation).await.unwrap();
    assert_eq!(responder.last().content, "foo from beta");
    assert!(!responder.last().ephemeral);
}

#[tokio::test]
async fn test_publish_runs_once_unless_it_fails() {
    let root = plugin_root(&[("alpha", "alpha")]);
    let (app, _bot) = start_app(root.path(), None).await;

    let failing = RecordingCatalog::failing();
    assert!(app.manager.publish_commands(&failing).await.is_err());

    let catalog = RecordingCatalog::default();
    let count = app.manager.publish_commands(&catalog).await.unwrap();
    assert!(count > 0);
    assert_eq!(app.manager.publish_commands(&catalog).await.unwrap(), 0);
    assert_eq!(catalog.calls().len(), 1);
}

#[tokio::test]
async fn test_events_reach_every_plugin_in_attachment_order() {
    let root = plugin_root(&[("alpha", "alpha"), ("beta", "beta")]);
    let (app, bot) = start_app(root.path(), None).await;

    assert_eq!(app.emit(ping()).await, 2);
    assert_eq!(bot.texts_to("log"), vec!["alpha", "beta"]);

    let info = app.manager.get_plugin_info("beta").unwrap();
    assert_eq!(info.events, vec!["ping"]);
    assert_eq!(info.commands, vec!["foo"]);
}

#[tokio::test]
async fn test_enable_and_disable_require_loaded_plugin() {
    let root = plugin_root(&[("alpha", "alpha")]);
    let (app, _bot) = start_app(root.path(), None).await;

    assert!(app.manager.is_enabled(GUILD, "alpha").await);
    assert!(app.manager.disable(GUILD, "alpha").await.unwrap());
    assert!(!app.manager.is_enabled(GUILD, "alpha").await);
    assert!(app.manager.is_enabled("other-guild", "alpha").await);
    assert!(app.manager.enable(GUILD, "alpha").await.unwrap());
    assert!(app.manager.is_enabled(GUILD, "alpha").await);

    assert!(matches!(
        app.manager.enable(GUILD, "ghost").await,
        Err(PluginError::NotLoaded(_))
    ));
    assert!(matches!(
        app.manager.disable(GUILD, "ghost").await,
        Err(PluginError::NotLoaded(_))
    ));
}

#[tokio::test]
async fn test_builtin_management_commands() {
    let root = plugin_root(&[("alpha", "alpha"), ("beta", "beta")]);
    let (app, _bot) = start_app(root.path(), None).await;

    let (list, responder) = invoke("plugin-list", "7");
    app.dispatch(&list).await.unwrap();
    let reply = responder.last();
    assert!(reply.ephemeral);
    assert!(reply.content.contains("**alpha**"));
    assert!(reply.content.contains("**beta**"));

    let (disable, responder) = invoke("plugin-disable", "7");
    let disable = disable.with_option("plugin", "alpha");
    app.dispatch(&disable).await.unwrap();
    app.dispatch(&disable).await.unwrap();
    let replies = responder.replies();
    assert!(replies[0].content.starts_with("✅"));
    assert!(replies[1].content.starts_with("⚠️"));

    let (info, responder) = invoke("plugin-info", "7");
    app.dispatch(&info.with_option("plugin", "alpha")).await.unwrap();
    let content = responder.last().content;
    assert!(content.contains("Commands: none"));
    assert!(content.contains("disabled"));

    let (enable, responder) = invoke("plugin-enable", "7");
    app.dispatch(&enable.with_option("plugin", "ghost")).await.unwrap();
    assert!(responder.last().content.starts_with("❌"));
}

#[tokio::test]
async fn test_reload_command_is_owner_only() {
    let root = plugin_root(&[("alpha", "alpha")]);
    let (app, _bot) = start_app(root.path(), None).await;

    let (reload, responder) = invoke("plugin-reload", "7");
    app.dispatch(&reload.with_option("plugin", "alpha")).await.unwrap();
    assert!(responder.last().content.contains("Permission denied"));

    let (reload, responder) = invoke("plugin-reload", OWNER);
    app.dispatch(&reload.with_option("plugin", "alpha")).await.unwrap();
    assert!(responder.last().content.starts_with("🔄"));
    assert!(app.manager.is_loaded("alpha"));
}

#[tokio::test]
async fn test_unknown_command_and_help() {
    let root = plugin_root(&[("alpha", "alpha")]);
    let (app, _bot) = start_app(root.path(), None).await;

    let (unknown, responder) = invoke("nope", "7");
    app.dispatch(&unknown).await.unwrap();
    assert_eq!(responder.last().content, "❌ Unknown command: /nope");

    let (help, responder) = invoke("help", "7");
    app.dispatch(&help).await.unwrap();
    let content = responder.last().content;
    assert!(content.contains("/plugin-list"));
    assert!(content.contains("/foo"));
}

#[tokio::test]
async fn test_same_name_from_two_directories_loads_once() {
    let root = plugin_root(&[("twin-a", "twin-first"), ("twin-b", "twin-second")]);
    let (app, bot) = start_idle_app(root.path()).await;

    let (a, b) = tokio::join!(app.manager.load_one("twin-a"), app.manager.load_one("twin-b"));
    let (winner, loser, label) = match (&a, &b) {
        (Ok(_), Err(PluginError::AlreadyLoaded(_))) => ("twin-a", "twin-b", "first"),
        (Err(PluginError::AlreadyLoaded(_)), Ok(_)) => ("twin-b", "twin-a", "second"),
        other => panic!("expected exactly one load to win: {:?}", other),
    };

    let info = app.manager.get_plugin_info("twin").unwrap();
    assert_eq!(info.directory, winner);
    assert_eq!(info.events, vec!["ping"]);
    assert_eq!(app.manager.state(winner), PluginState::Loaded);
    assert!(matches!(app.manager.state(loser), PluginState::Failed(_)));

    let dup: Vec<_> = app
        .manager
        .command_snapshot()
        .into_iter()
        .filter(|c| c.name == "dup")
        .collect();
    assert_eq!(dup.len(), 1);
    assert_eq!(dup[0].description, format!("dup from {}", label));

    let (invocation, responder) = invoke("dup", "7");
    app.dispatch(&invocation).await.unwrap();
    assert_eq!(responder.last().content, format!("dup from {}", label));

    assert_eq!(app.emit(ping()).await, 1);
    assert_eq!(bot.texts_to("log"), vec![label]);
}

#[tokio::test]
async fn test_second_directory_with_loaded_name_is_not_loaded() {
    let root = plugin_root(&[("alpha", "alpha"), ("alpha-copy", "alpha")]);
    let (app, _bot) = start_app(root.path(), None).await;

    assert_eq!(app.manager.list_plugins().len(), 1);
    assert_eq!(app.manager.get_plugin_info("alpha").unwrap().directory, "alpha");
    assert_eq!(app.manager.state("alpha"), PluginState::Loaded);
    assert!(matches!(app.manager.state("alpha-copy"), PluginState::Failed(_)));

    let err = app.manager.load_one("alpha-copy").await.unwrap_err();
    assert!(matches!(err, PluginError::AlreadyLoaded(_)));
    assert!(matches!(app.manager.state("alpha-copy"), PluginState::Failed(_)));
    assert_eq!(app.manager.state("alpha"), PluginState::Loaded);
}

#[tokio::test]
async fn test_failed_on_unload_still_tears_down() {
    let root = plugin_root(&[("stubborn", "stubborn")]);
    let (app, bot) = start_app(root.path(), None).await;
    assert!(app.manager.is_loaded("stubborn"));

    app.manager.unload_one("stubborn").await.unwrap();

    assert!(!app.manager.is_loaded("stubborn"));
    assert_eq!(app.manager.state("stubborn"), PluginState::Unloaded);
    assert!(app.manager.router().events_of("stubborn").is_empty());
    assert!(!app.manager.command_snapshot().iter().any(|c| c.name == "stubborn"));
    assert_eq!(app.emit(ping()).await, 0);
    assert!(bot.texts_to("log").is_empty());
}

#[tokio::test]
async fn test_invalid_entries_are_skipped() {
    let root = plugin_root(&[("sloppy", "sloppy")]);
    let (app, bot) = start_app(root.path(), None).await;

    assert!(app.manager.is_loaded("sloppy"));
    let info = app.manager.get_plugin_info("sloppy").unwrap();
    assert_eq!(info.commands, vec!["tidy"]);
    assert_eq!(info.events, vec!["ping"]);

    let names: Vec<_> = app.manager.command_snapshot().into_iter().map(|c| c.name).collect();
    assert!(names.contains(&"tidy".to_string()));
    assert!(!names.contains(&"Bad Name".to_string()));
    assert!(!names.contains(&"no-handler".to_string()));

    assert_eq!(app.emit(ping()).await, 1);
    assert_eq!(bot.texts_to("log"), vec!["sloppy"]);
}

#[tokio::test]
async fn test_unload_cancels_pending_one_shot_listener() {
    let root = plugin_root(&[("watcher", "watcher")]);
    let (app, bot) = start_app(root.path(), None).await;
    assert_eq!(app.manager.router().events_of("watcher"), vec!["ping"]);

    app.manager.unload_one("watcher").await.unwrap();

    assert!(app.manager.router().events_of("watcher").is_empty());
    assert_eq!(app.emit(ping()).await, 0);
    assert!(bot.texts_to("log").is_empty());
}

#[tokio::test]
async fn test_one_shot_listener_fires_once() {
    let root = plugin_root(&[("watcher", "watcher")]);
    let (app, bot) = start_app(root.path(), None).await;

    assert_eq!(app.emit(ping()).await, 1);
    assert_eq!(app.emit(ping()).await, 0);
    assert_eq!(bot.texts_to("log"), vec!["watcher"]);
}

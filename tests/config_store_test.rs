//! Guild plugin config: defaults, durable store and cache fallback
//! Run with: cargo test --test config_store_test

mod common;

use std::sync::Arc;

use serde_json::json;

use common::{ensure_init, FailingStore};
use guildkit::application::errors::ConfigValidationError;
use guildkit::application::services::ConfigStore;
use guildkit::domain::entities::ConfigMap;
use guildkit::domain::traits::{ConnectionState, Store};
use guildkit::infrastructure::database::SqliteStore;
use guildkit::infrastructure::storage::MemoryStore;
use guildkit::plugins::{FieldSpec, FieldType, PluginDescriptor};

fn config(value: serde_json::Value) -> ConfigMap {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_unknown_pairs_default_to_enabled() {
    ensure_init();
    let stores = [
        ConfigStore::in_memory(),
        ConfigStore::new(Some(Arc::new(MemoryStore::new()))),
        ConfigStore::new(Some(Arc::new(SqliteStore::open_in_memory().unwrap()))),
    ];

    for store in &stores {
        for (guild, plugin) in [("1", "welcome"), ("2", "server-info"), ("", "anything")] {
            assert!(store.get_enabled(guild, plugin).await);
            assert!(store.get_config(guild, plugin).await.is_empty());
        }
    }
}

#[tokio::test]
async fn test_outage_falls_back_to_cache_without_sync() {
    ensure_init();
    let durable = Arc::new(MemoryStore::new());
    let store = ConfigStore::new(Some(durable.clone()));
    assert!(store.is_available());

    durable.set_state(ConnectionState::Disconnected);
    assert!(!store.is_available());

    store.set_enabled("g", "welcome", false).await;
    store
        .set_config("g", "welcome", config(json!({"welcomeChannel": "600"})))
        .await;
    assert!(!store.get_enabled("g", "welcome").await);
    assert_eq!(store.get_config("g", "welcome").await["welcomeChannel"], "600");

    // Cached writes are not replayed into the recovered store
    durable.set_state(ConnectionState::Connected);
    assert!(durable.find("g", "welcome").await.unwrap().is_none());
    assert!(durable.is_empty().await);
    assert!(store.get_enabled("g", "welcome").await);
}

#[tokio::test]
async fn test_failing_calls_fall_back_to_cache() {
    ensure_init();
    let store = ConfigStore::new(Some(Arc::new(FailingStore)));
    assert!(store.is_available());

    assert!(store.get_enabled("g", "welcome").await);
    assert!(store.get_config("g", "welcome").await.is_empty());

    store.set_enabled("g", "welcome", false).await;
    store
        .set_config("g", "welcome", config(json!({"welcomeChannel": "600"})))
        .await;

    assert!(!store.get_enabled("g", "welcome").await);
    assert_eq!(store.get_config("g", "welcome").await["welcomeChannel"], "600");
    assert!(store.get_enabled("g", "server-info").await);
}

#[tokio::test]
async fn test_sqlite_outage_and_recovery() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let sqlite = Arc::new(SqliteStore::open(dir.path().join("guildkit.db")).unwrap());
    let store = ConfigStore::new(Some(sqlite.clone()));

    store.set_enabled("g", "welcome", false).await;

    sqlite.close();
    assert!(!store.is_available());
    store.set_enabled("g", "server-info", false).await;
    assert!(!store.get_enabled("g", "server-info").await);

    sqlite.reopen().unwrap();
    assert!(store.is_available());
    assert!(!store.get_enabled("g", "welcome").await);
    assert!(sqlite.find("g", "server-info").await.unwrap().is_none());
}

#[tokio::test]
async fn test_durable_writes_survive_restart() {
    ensure_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("guildkit.db");

    {
        let store = ConfigStore::new(Some(Arc::new(SqliteStore::open(&path).unwrap())));
        store.set_enabled("g", "welcome", false).await;
        store
            .set_config("g", "welcome", config(json!({"welcomeChannel": "600", "enabledWelcome": true})))
            .await;
    }

    let store = ConfigStore::new(Some(Arc::new(SqliteStore::open(&path).unwrap())));
    assert!(!store.get_enabled("g", "welcome").await);
    let stored = store.get_config("g", "welcome").await;
    assert_eq!(stored["welcomeChannel"], "600");
    assert_eq!(stored["enabledWelcome"], true);
}

#[test]
fn test_schema_validation() {
    let empty = PluginDescriptor::new("p", "1.0.0", "d", "a");
    assert!(empty.validate_config(&ConfigMap::new()).unwrap());
    assert!(empty.validate_config(&config(json!({"x": [1, 2]}))).unwrap());

    let schema = PluginDescriptor::new("welcome", "1.0.0", "d", "a")
        .with_field("welcomeChannel", FieldSpec::required(FieldType::String))
        .with_field("enabledWelcome", FieldSpec::optional(FieldType::Boolean));

    assert_eq!(
        schema.validate_config(&ConfigMap::new()).unwrap_err(),
        ConfigValidationError::MissingField {
            field: "welcomeChannel".to_string()
        }
    );
    let err = schema
        .validate_config(&config(json!({"welcomeChannel": "1", "enabledWelcome": "yes"})))
        .unwrap_err();
    assert!(err.to_string().contains("enabledWelcome"));
    assert!(schema
        .validate_config(&config(json!({"welcomeChannel": "1"})))
        .unwrap());
}

//! SQLite-backed durable store for guild plugin configuration

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use crate::application::errors::StorageError;
use crate::domain::entities::{ConfigMap, GuildPluginConfig};
use crate::domain::traits::{ConnectionState, Store};

pub struct SqliteStore {
    conn: Mutex<Option<Connection>>,
    /// `None` for in-memory databases, which cannot be reopened
    path: Option<PathBuf>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        init_tables(&conn)?;
        info!("Opened plugin config database at {}", path.display());
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: Some(path),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        init_tables(&conn)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: None,
        })
    }

    /// Drop the connection; calls fail with `Unavailable` until `reopen`
    pub fn close(&self) {
        if self.lock().take().is_some() {
            debug!("Closed plugin config database");
        }
    }

    pub fn reopen(&self) -> Result<(), StorageError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| StorageError::Database("in-memory database cannot be reopened".to_string()))?;
        let conn = Connection::open(path)?;
        init_tables(&conn)?;
        *self.lock() = Some(conn);
        debug!("Reopened plugin config database");
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(StorageError::Unavailable)?;
        f(conn)
    }
}

fn init_tables(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS guild_plugin_configs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            guild_id TEXT NOT NULL,
            plugin_name TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            config TEXT NOT NULL DEFAULT '{}',
            installed_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (guild_id, plugin_name)
        )",
        [],
    )?;
    Ok(())
}

fn select(conn: &Connection, guild_id: &str, plugin_name: &str) -> Result<Option<GuildPluginConfig>, StorageError> {
    let row = conn
        .query_row(
            "SELECT enabled, config, installed_at, updated_at
             FROM guild_plugin_configs WHERE guild_id = ?1 AND plugin_name = ?2",
            params![guild_id, plugin_name],
            |row| {
                Ok((
                    row.get::<_, bool>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((enabled, config, installed_at, updated_at)) = row else {
        return Ok(None);
    };
    Ok(Some(GuildPluginConfig {
        guild_id: guild_id.to_string(),
        plugin_name: plugin_name.to_string(),
        enabled,
        config: serde_json::from_str(&config)?,
        installed_at: parse_time(&installed_at)?,
        updated_at: parse_time(&updated_at)?,
    }))
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Serialization(format!("invalid timestamp '{}': {}", value, e)))
}

/// Upsert the row and read it back
fn upsert(
    conn: &Connection,
    guild_id: &str,
    plugin_name: &str,
    enabled: Option<bool>,
    config: Option<&ConfigMap>,
) -> Result<GuildPluginConfig, StorageError> {
    let now = Utc::now().to_rfc3339();
    let config = config.map(serde_json::to_string).transpose()?;

    conn.execute(
        "INSERT INTO guild_plugin_configs
            (guild_id, plugin_name, enabled, config, installed_at, updated_at)
         VALUES (?1, ?2, COALESCE(?3, 1), COALESCE(?4, '{}'), ?5, ?5)
         ON CONFLICT (guild_id, plugin_name) DO UPDATE SET
            enabled = COALESCE(?3, enabled),
            config = COALESCE(?4, config),
            updated_at = ?5",
        params![guild_id, plugin_name, enabled, config, now],
    )?;

    select(conn, guild_id, plugin_name)?
        .ok_or_else(|| StorageError::NotFound(format!("{}/{}", guild_id, plugin_name)))
}

#[async_trait]
impl Store for SqliteStore {
    fn state(&self) -> ConnectionState {
        if self.lock().is_some() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    async fn find(
        &self,
        guild_id: &str,
        plugin_name: &str,
    ) -> Result<Option<GuildPluginConfig>, StorageError> {
        self.with_conn(|conn| select(conn, guild_id, plugin_name))
    }

    async fn set_enabled(
        &self,
        guild_id: &str,
        plugin_name: &str,
        enabled: bool,
    ) -> Result<GuildPluginConfig, StorageError> {
        self.with_conn(|conn| upsert(conn, guild_id, plugin_name, Some(enabled), None))
    }

    async fn set_config(
        &self,
        guild_id: &str,
        plugin_name: &str,
        config: &ConfigMap,
    ) -> Result<GuildPluginConfig, StorageError> {
        self.with_conn(|conn| upsert(conn, guild_id, plugin_name, None, Some(config)))
    }
}

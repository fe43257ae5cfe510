use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::AppError;

/// Fixed keys under which each service persists its state blob.
pub mod keys {
    pub const HISTORY: &str = "videoHistory";
    pub const FAVORITES: &str = "videoFavorites";
    pub const POSITIONS: &str = "videoPlaybackPositions";
    pub const CHANNELS: &str = "subscribedChannels";
    pub const CHANNEL_VIDEOS: &str = "channelVideos";
}

/// Opaque key-value persistence. An absent key means "empty initial state";
/// callers treat an undecodable blob the same way.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn save(&self, key: &str, blob: &str) -> Result<(), AppError>;
    async fn load(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

pub struct SqliteKeyValueStore {
    pool: Pool<Sqlite>,
}

impl SqliteKeyValueStore {
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        log::info!("Connecting to store at: {:?}", path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true),
            )
            .await
            .map_err(|e| AppError::Data(format!("Failed to connect to store: {}", e)))?;

        let schema = include_str!("schema.sql");

        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&pool).await.map_err(|e| {
                    AppError::Data(format!("Failed to execute schema statement '{}': {}", stmt, e))
                })?;
            }
        }

        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn save(&self, key: &str, blob: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(blob)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn save(&self, key: &str, blob: &str) -> Result<(), AppError> {
        self.entries
            .write()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_blobs() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.load("missing").await.unwrap(), None);

        store.save("k", "{\"a\":1}").await.unwrap();
        assert_eq!(store.load("k").await.unwrap().as_deref(), Some("{\"a\":1}"));

        store.save("k", "{\"a\":2}").await.unwrap();
        assert_eq!(store.load("k").await.unwrap().as_deref(), Some("{\"a\":2}"));

        store.remove("k").await.unwrap();
        assert_eq!(store.load("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sqlite_store_persists_across_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");

        {
            let store = SqliteKeyValueStore::open(&path).await.unwrap();
            store.save(keys::HISTORY, "[]").await.unwrap();
            store.save(keys::HISTORY, "[{\"id\":\"abc\"}]").await.unwrap();
        }

        let store = SqliteKeyValueStore::open(&path).await.unwrap();
        assert_eq!(
            store.load(keys::HISTORY).await.unwrap().as_deref(),
            Some("[{\"id\":\"abc\"}]")
        );

        store.remove(keys::HISTORY).await.unwrap();
        assert_eq!(store.load(keys::HISTORY).await.unwrap(), None);
    }
}

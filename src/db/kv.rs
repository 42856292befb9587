//! Key-value persistence used by the roster.
//!
//! Every `put` replaces the whole value in a single statement, so readers never
//! observe a partial write.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;

/// A stored value together with its write counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredValue {
    pub value: String,
    pub revision: i64,
}

/// Durable string storage keyed by name.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, AppError>;

    /// Overwrite the value under `key` and return its new revision.
    async fn put(&self, key: &str, value: &str) -> Result<i64, AppError>;
}

/// SQLite-backed store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, AppError> {
        let row = sqlx::query("SELECT value, revision FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| StoredValue {
            value: row.get("value"),
            revision: row.get("revision"),
        }))
    }

    async fn put(&self, key: &str, value: &str) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        let row = sqlx::query(
            r#"INSERT INTO kv_store (key, value, revision, updated_at) VALUES (?, ?, 1, ?)
               ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   revision = kv_store.revision + 1,
                   updated_at = excluded.updated_at
               RETURNING revision"#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("revision"))
    }
}

/// In-memory store for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, StoredValue>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing any encoding.
    pub fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(
                key.to_string(),
                StoredValue {
                    value: value.to_string(),
                    revision: 1,
                },
            );
        }
        store
    }
}

#[cfg(test)]
#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, AppError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("Memory store lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<i64, AppError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("Memory store lock poisoned".to_string()))?;
        let revision = entries.get(key).map(|v| v.revision + 1).unwrap_or(1);
        entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                revision,
            },
        );
        Ok(revision)
    }
}

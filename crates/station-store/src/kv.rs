//! Key-value storage backends.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use crate::{Database, Result};

/// A string key-value store.
///
/// `put_all` writes every pair atomically: either all keys are updated or none.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write several keys in one transaction.
    async fn put_all(&self, entries: &[(&str, String)]) -> Result<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Get a raw value by key.
pub async fn get_value(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value = sqlx::query_scalar::<_, String>(
        r#"
        SELECT value
        FROM kv_store
        WHERE key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(value)
}

/// Create or update several entries in a single transaction.
pub async fn upsert_values(pool: &SqlitePool, entries: &[(&str, String)]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for (key, value) in entries {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value)
            VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            "#,
        )
        .bind(*key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Delete an entry by key.
pub async fn delete_value(pool: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM kv_store
        WHERE key = ?
        "#,
    )
    .bind(key)
    .execute(pool)
    .await?;

    Ok(())
}

#[async_trait]
impl KeyValueStore for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        get_value(self.pool(), key).await
    }

    async fn put_all(&self, entries: &[(&str, String)]) -> Result<()> {
        upsert_values(self.pool(), entries).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        delete_value(self.pool(), key).await
    }
}

/// An in-process store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put_all(&self, entries: &[(&str, String)]) -> Result<()> {
        let mut map = self.entries.write().await;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

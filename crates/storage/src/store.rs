//! The key-value storage seam and its two backends.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{kv, Database, Result};

/// Durable string-keyed storage of JSON records.
///
/// The dashboard only needs get/put/remove; the schema of each record is
/// owned by [`crate::settings`].
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a raw value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a raw value, replacing any previous one.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value if present.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    database: Database,
}

impl SqliteStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(kv::get_entry(self.database.pool(), key)
            .await?
            .map(|entry| entry.value))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        kv::upsert_value(self.database.pool(), key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        kv::delete_value(self.database.pool(), key).await
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.put("company", "{\"name\":\"Acme\"}").await.unwrap();
        assert_eq!(
            store.get("company").await.unwrap().as_deref(),
            Some("{\"name\":\"Acme\"}")
        );

        store.put("company", "{}").await.unwrap();
        assert_eq!(store.get("company").await.unwrap().as_deref(), Some("{}"));

        store.remove("company").await.unwrap();
        assert_eq!(store.get("company").await.unwrap(), None);

        // Removing twice is fine
        store.remove("company").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        exercise(&SqliteStore::new(db)).await;
    }
}

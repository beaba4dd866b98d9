//! Key-value CRUD operations.

use sqlx::SqlitePool;

use crate::models::KvEntry;
use crate::Result;

/// Create or replace a value.
pub async fn upsert_value(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = datetime('now')
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get an entry by key.
pub async fn get_entry(pool: &SqlitePool, key: &str) -> Result<Option<KvEntry>> {
    let entry = sqlx::query_as::<_, KvEntry>(
        r#"
        SELECT key, value, updated_at
        FROM kv_store
        WHERE key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Delete a value. Deleting a missing key is not an error.
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

/// List all stored keys.
pub async fn list_keys(pool: &SqlitePool) -> Result<Vec<String>> {
    let keys = sqlx::query_scalar::<_, String>(
        r#"
        SELECT key
        FROM kv_store
        ORDER BY key
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(keys)
}

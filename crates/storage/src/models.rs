//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A raw key-value row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct KvEntry {
    /// Record name (e.g. "suppliers").
    pub key: String,
    /// JSON-encoded record.
    pub value: String,
    /// Last update timestamp.
    pub updated_at: String,
}

//! SQLite persistence layer for ChainGuard.
//!
//! This crate stores the supplier registry, company identity, visible-sector
//! set and sign-in flag as JSON records in a single key-value table, using
//! SQLx with SQLite. There is no schema versioning: an unreadable record is
//! treated as absent and replaced by its default.
//!
//! # Example
//!
//! ```no_run
//! use risk_core::SystemClock;
//! use storage::{settings::PersistedState, Database, SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:chainguard.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let store = SqliteStore::new(db);
//!     let state = PersistedState::load(&store, &SystemClock).await;
//!     println!("{} suppliers", state.suppliers.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod kv;
pub mod models;
pub mod settings;
pub mod store;

pub use error::{Result, StorageError};
pub use models::KvEntry;
pub use settings::{PersistedState, RiskSnapshot};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// In-memory databases are per-connection, so connect those with
    /// [`Database::connect_with_pool_size`] and a pool size of 1.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

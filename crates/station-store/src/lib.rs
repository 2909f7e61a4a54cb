//! Persistence for saved stations and settings.
//!
//! This crate provides a string key-value store (SQLite through SQLx, or an
//! in-memory map) and the [`StationRepository`], the only component allowed to
//! mutate persisted commute state.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use commute_core::{Station, TransportKind};
//! use station_store::{Database, StationRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:commute.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let mut repo = StationRepository::load(Arc::new(db)).await?;
//!     repo.toggle(TransportKind::Rail, Station::named("中壢")).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod kv;
pub mod repository;

pub use error::{Result, StoreError};
pub use kv::{KeyValueStore, MemoryStore};
pub use repository::{StationRepository, ToggleOutcome, LEGACY_API_KEY_KEY, SETTINGS_KEY};

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
    const DEFAULT_POOL_SIZE: u32 = 4;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// In-memory URLs (`sqlite::memory:`) get a single connection so every
    /// query sees the same database.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool_size = if url.contains(":memory:") {
            1
        } else {
            Self::DEFAULT_POOL_SIZE
        };
        Self::connect_with_pool_size(url, pool_size).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

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

//! Database module providing connection management, migrations and queries.
//!
//! Simple lookups are methods on [`DbPool`]. Queries that also run inside a
//! matching or recalculation transaction are free functions generic over
//! [`ConnectionTrait`].

pub mod api_keys;
pub mod catalog_entries;
pub mod deletion_records;
pub mod elements;
pub mod materials;
pub mod projects;
pub mod uploads;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::migration::Migrator;

/// Maximum number of values bound into a single `IN (...)` clause.
pub(crate) const IN_CHUNK_SIZE: usize = 1000;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect using the configured database URL and pool limits.
    pub async fn new(config: &Config) -> AppResult<Self> {
        let mut opts = ConnectOptions::new(config.database.url.clone());
        opts.max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opts)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect: {}", e)))?;

        Ok(Self { conn })
    }

    /// Wrap an existing connection (used by tests and CLI tools).
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get the underlying connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Apply pending migrations.
    pub async fn run_migrations(&self) -> AppResult<()> {
        Migrator::up(&self.conn, None)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
    }

    /// Round-trip to the database for readiness checks.
    pub async fn ping(&self) -> AppResult<()> {
        self.conn
            .ping()
            .await
            .map_err(|e| AppError::Database(format!("Database ping failed: {}", e)))
    }
}

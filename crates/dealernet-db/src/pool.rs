//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  dashboard-api startup                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ├── HTTP handlers                                                │
//! │       ├── metrics recompute task                                       │
//! │       └── weekly forecast job                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases use WAL so the recompute task's reads don't block the
//! request handlers' writes.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use dealernet_core::SourceCollections;

use crate::changes::{ChangeFeed, CollectionChange, DEFAULT_FEED_CAPACITY};
use crate::document::DocumentStore;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    DealershipRepository, ForecastRepository, GoalRepository, MetricsRepository, SaleRepository,
    TransferRepository, UserRepository, VehicleRepository,
};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/dealernet/dealernet.db")
///     .max_connections(8)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Use a private in-memory database instead of the file.
    pub in_memory: bool,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,

    /// Buffered changes per subscriber.
    pub change_feed_capacity: usize,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            in_memory: false,
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
            change_feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Isolated, gone when the pool closes
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            in_memory: true,
            // Every connection would get its own empty database
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            // The database lives only as long as its connection
            idle_timeout: Duration::from_secs(24 * 60 * 60),
            run_migrations: true,
            change_feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// ## Ownership
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Database (cheap to clone)                                              │
/// │  ├── SqlitePool    shared by every repository                           │
/// │  └── ChangeFeed    shared by every DocumentStore                        │
/// │                                                                         │
/// │  db.sales()  db.vehicles()  db.transfers()  ...                         │
/// │       └── each wraps a DocumentStore over the same pool and feed        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./dealernet.db")).await?;
/// let vehicles = db.vehicles().list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
    changes: ChangeFeed,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads (file databases only)
    ///    - NORMAL synchronous
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            in_memory = config.in_memory,
            "Initializing database connection"
        );

        let connect_options = if config.in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            // sqlite://path creates file if not exists
            let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
            SqliteConnectOptions::from_str(&connect_url)
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .create_if_missing(true)
        };

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            changes: ChangeFeed::new(config.change_feed_capacity),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Raw document access. Prefer the typed repositories.
    pub fn documents(&self) -> DocumentStore {
        DocumentStore::new(self.pool.clone(), self.changes.clone())
    }

    /// Receives every committed write from now on.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<CollectionChange> {
        self.changes.subscribe()
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.documents())
    }

    pub fn vehicles(&self) -> VehicleRepository {
        VehicleRepository::new(self.documents())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.documents())
    }

    pub fn dealerships(&self) -> DealershipRepository {
        DealershipRepository::new(self.documents())
    }

    pub fn goals(&self) -> GoalRepository {
        GoalRepository::new(self.documents())
    }

    pub fn transfers(&self) -> TransferRepository {
        TransferRepository::new(self.documents())
    }

    pub fn forecasts(&self) -> ForecastRepository {
        ForecastRepository::new(self.documents())
    }

    pub fn metrics(&self) -> MetricsRepository {
        MetricsRepository::new(self.documents())
    }

    /// Reads the five joined collections concurrently.
    ///
    /// Each collection is read as of its own query; a write landing between
    /// them shows up in the next recompute.
    pub async fn source_collections(&self) -> DbResult<SourceCollections> {
        let (sale_repo, vehicle_repo, user_repo, dealership_repo, goal_repo) = (
            self.sales(),
            self.vehicles(),
            self.users(),
            self.dealerships(),
            self.goals(),
        );
        let (sales, vehicles, users, dealerships, goals) = tokio::try_join!(
            sale_repo.list(),
            vehicle_repo.list(),
            user_repo.list(),
            dealership_repo.list(),
            goal_repo.list(),
        )?;

        Ok(SourceCollections {
            sales,
            vehicles,
            users,
            dealerships,
            goals,
        })
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dealernet_core::{Dealership, Role, User};

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
        assert!(!config.in_memory);
    }

    #[tokio::test]
    async fn test_source_collections_reads_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let dealership = Dealership {
            id: "d-1".to_string(),
            name: "Maple Motors".to_string(),
            city: "Toronto".to_string(),
            province: "Ontario".to_string(),
            coords: Default::default(),
        };
        db.dealerships().insert(&dealership).await.unwrap();
        db.users()
            .insert(&User {
                id: "factory".to_string(),
                username: "factory".to_string(),
                name: "Fran".to_string(),
                role: Role::Factory,
                dealership_id: None,
                commission_rate_bps: None,
            })
            .await
            .unwrap();

        let sources = db.source_collections().await.unwrap();
        assert_eq!(sources.dealerships, vec![dealership]);
        assert_eq!(sources.users.len(), 1);
        assert!(sources.sales.is_empty());
        assert!(sources.vehicles.is_empty());
        assert!(sources.goals.is_empty());
    }
}

//! # dealernet-db: Storage Layer for DealerNet
//!
//! Persists every collection as JSON documents in SQLite and announces each
//! committed write on a change feed.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DealerNet Data Flow                              │
//! │                                                                         │
//! │  dashboard-api handler (createSale, updateTransferStatus, ...)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   dealernet-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ VehicleRepo   │    │ 001_documents│  │   │
//! │  │   │ ChangeFeed    │    │ TransferRepo  │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │                    ▼                               │   │
//! │  │           │            DocumentStore (document.rs)             │   │
//! │  │           │            batches, version checks                 │   │
//! │  └───────────┼────────────────────────────────────────────────────┘   │
//! │              │                                                          │
//! │              └──► subscribers (metrics recompute) via changes.rs        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`document`] - Collections, versioned reads, atomic write batches
//! - [`changes`] - Broadcast of committed writes
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Typed repositories per collection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dealernet_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./dealernet.db")).await?;
//! let sources = db.source_collections().await?;
//! let snapshot = MetricsSnapshot::compute(sources, Utc::now());
//! db.metrics().put_dashboard(&snapshot).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod changes;
pub mod document;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use changes::{ChangeFeed, CollectionChange};
pub use document::{Collection, DocumentStore, Versioned, WriteBatch};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    DealershipRepository, ForecastRepository, GoalRepository, MetricsRepository, SaleRepository,
    TransferRepository, UserRepository, VehicleRepository,
};

//! # dealernet-core: Pure Business Logic for DealerNet
//!
//! This crate is the **heart** of DealerNet. It contains the metrics
//! aggregation and reporting engine as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DealerNet Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard Frontend                           │   │
//! │  │     KPIs ──► Regional chart ──► Top performers ──► Reports     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP (JSON)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    dashboard-api                                │   │
//! │  │    getDashboardMetrics, generateReport, updateTransferStatus   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ dealernet-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐  │   │
//! │  │   │   join   │─►│ metrics  │  │  report  │  │   transfer   │  │   │
//! │  │   │ try_join │  │ KPIs     │  │ CSV      │  │ state machine│  │   │
//! │  │   └────┬─────┘  │ rankings │  └────▲─────┘  └──────────────┘  │   │
//! │  │        │        └──────────┘       │                           │   │
//! │  │        ├───────────────────────────┘        ┌──────────────┐  │   │
//! │  │        └───────────────────────────────────►│   forecast   │  │   │
//! │  │                                             └──────────────┘  │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • `now` IS A PARAMETER     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 dealernet-db (Storage Layer)                    │   │
//! │  │          SQLite documents, change feed, transactions            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Vehicle, Sale, User, Dealership, Goal, ...)
//! - [`money`] - Money type with integer arithmetic, commission math
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`join`] - Entity join layer (`try_join`, `enrich_sales`)
//! - [`metrics`] - Aggregation engine and the metrics snapshot
//! - [`report`] - CSV report generator
//! - [`forecast`] - Demand forecast math
//! - [`transfer`] - Transfer request state machine
//! - [`sale`] - Sale recording (profit / commission frozen at creation)
//! - [`inventory`] - Vehicle lifecycle transitions
//! - [`registry`] - User, dealership and goal registration
//!
//! ## Example Usage
//!
//! ```rust
//! use dealernet_core::money::Money;
//! use dealernet_core::types::CommissionRate;
//!
//! let profit = Money::from_major_minor(6500, 0);
//! let commission = profit.apply_rate(CommissionRate::from_bps(1000)); // 10%
//! assert_eq!(commission, Money::from_major_minor(650, 0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod forecast;
pub mod inventory;
pub mod join;
pub mod metrics;
pub mod money;
pub mod registry;
pub mod report;
pub mod sale;
pub mod transfer;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use join::{enrich_sales, EntityIndex, SourceCollections};
pub use metrics::MetricsSnapshot;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Commission rate assigned to newly created salespeople (10%).
pub const DEFAULT_COMMISSION_RATE_BPS: u32 = 1000;

/// Length of the salesperson leaderboard in the metrics snapshot.
pub const TOP_SALESPEOPLE_LIMIT: usize = 10;

/// Length of the dealership leaderboard in the metrics snapshot.
pub const TOP_DEALERSHIPS_LIMIT: usize = 5;

/// Trailing window (calendar months) used by the demand forecast.
pub const FORECAST_WINDOW_MONTHS: u32 = 3;

/// Dealership column value for vehicles that are still at the factory.
pub const FACTORY_LABEL: &str = "Factory";

/// Days added to the approval time to estimate a transfer's arrival.
pub const TRANSFER_TRANSIT_DAYS: i64 = 7;

/// Location recorded on a vehicle when its transfer is approved.
pub const TRANSFER_ORIGIN_LOCATION: &str = "Origin distribution center";

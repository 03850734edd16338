//! # DealerNet Dashboard API
//!
//! HTTP server for the dealership dashboard, plus the two background tasks
//! that keep derived documents current.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Dashboard API                                   │
//! │                                                                         │
//! │  Dashboard ──► POST /v1/* ──► Caller (JWT) ──► services ──► dealernet-db│
//! │                                                                 │       │
//! │                                                     change feed │       │
//! │                                                                 ▼       │
//! │  ┌────────────────────┐                        ┌──────────────────────┐│
//! │  │  ForecastScheduler │  Sunday 00:00 UTC      │  MetricsRecomputer   ││
//! │  │  demand_forecasts  │                        │  metrics/dashboard   ││
//! │  └────────────────────┘                        └──────────────────────┘│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Callable Operations
//! - `getDashboardMetrics` - fresh snapshot, not stored
//! - `generateReport` - CSV export, detailed or summary
//! - `updateTransferStatus` - the transfer decision transaction
//! - write operations (`createSale`, `addVehicle`, ...) that feed the
//!   recompute subscription
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - HTTP server port (default: 8080)
//! - `DATABASE_PATH` - SQLite file (default: ./dealernet.db)
//! - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 3600)
//! - `RECOMPUTE_COALESCE_MS` - Recompute quiet period (default: 50)
//! - `FORECAST_ENABLED` - Run the weekly forecast (default: true)

pub mod auth;
pub mod config;
pub mod error;
pub mod recompute;
pub mod routes;
pub mod scheduler;
pub mod services;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

use dealernet_db::Database;

use crate::auth::JwtManager;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
    pub jwt: JwtManager,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        AppState { db, config, jwt }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};
    use dealernet_core::{
        Dealership, Role, User, Vehicle, VehicleHistoryEntry, VehicleStatus,
    };
    use dealernet_db::{Database, DbConfig};

    use crate::auth::Caller;
    use crate::{ApiConfig, AppState};

    pub fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap()
    }

    pub fn caller(id: &str) -> Caller {
        Caller {
            user_id: id.to_string(),
        }
    }

    pub fn vehicle(vin: &str, model: &str, status: VehicleStatus, dealership: Option<&str>) -> Vehicle {
        Vehicle {
            vin: vin.to_string(),
            model: model.to_string(),
            color: "Blue".to_string(),
            year: 2024,
            cost_price_cents: 2_500_000,
            status,
            dealership_id: dealership.map(str::to_string),
            history: vec![VehicleHistoryEntry {
                status,
                date: at(1, 1),
            }],
            estimated_arrival_date: None,
            current_location: None,
        }
    }

    fn user(id: &str, role: Role, dealership: Option<&str>) -> User {
        User {
            id: id.to_string(),
            username: id.to_string(),
            name: format!("User {}", id),
            role,
            dealership_id: dealership.map(str::to_string),
            commission_rate_bps: (role == Role::Salesperson).then_some(1000),
        }
    }

    /// d-1 (Ontario) and d-2 (Alberta) with an admin each, sp-1 at d-1, a
    /// factory user, three in-stock Rangers at d-1, one Bronco at d-2 and
    /// one vehicle at the factory. Every vehicle costs 25,000.
    pub async fn state() -> Arc<AppState> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for (id, name, province) in [("d-1", "Maple Motors", "Ontario"), ("d-2", "Prairie Ford", "Alberta")] {
            db.dealerships()
                .insert(&Dealership {
                    id: id.to_string(),
                    name: name.to_string(),
                    city: "City".to_string(),
                    province: province.to_string(),
                    coords: Default::default(),
                })
                .await
                .unwrap();
        }
        for u in [
            user("factory", Role::Factory, None),
            user("admin-1", Role::DealershipAdmin, Some("d-1")),
            user("admin-2", Role::DealershipAdmin, Some("d-2")),
            user("sp-1", Role::Salesperson, Some("d-1")),
        ] {
            db.users().insert(&u).await.unwrap();
        }
        for v in [
            vehicle("VIN0001", "Ranger", VehicleStatus::InStock, Some("d-1")),
            vehicle("VIN0002", "Ranger", VehicleStatus::InStock, Some("d-1")),
            vehicle("VIN0003", "Ranger", VehicleStatus::InStock, Some("d-1")),
            vehicle("VIN0004", "Bronco", VehicleStatus::InStock, Some("d-2")),
            vehicle("VIN0005", "Maverick", VehicleStatus::AtFactory, None),
        ] {
            db.vehicles().insert(&v).await.unwrap();
        }

        let config = ApiConfig {
            jwt_secret: "test-secret".to_string(),
            ..ApiConfig::default()
        };
        Arc::new(AppState::new(db, config))
    }
}

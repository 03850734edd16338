//! # Repository Module
//!
//! Typed repositories over the document store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.transfers().decide(id, caller, decision, now)              │
//! │       ▼                                                                 │
//! │  TransferRepository                                                    │
//! │  ├── read transfer, caller, vehicle (with versions)                     │
//! │  ├── dealernet_core::transfer::apply_decision(...)   ← rules           │
//! │  └── WriteBatch: transfer + vehicle, both version-checked              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DocumentStore ──► SQLite `documents` table                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rules live in `dealernet-core`; repositories only load inputs,
//! call the rule, and persist the outcome atomically.
//!
//! ## Available Repositories
//!
//! - [`SaleRepository`] - Sales; recording a sale also marks the vehicle sold
//! - [`VehicleRepository`] - Factory intake, assignment, delivery
//! - [`UserRepository`] / [`DealershipRepository`] - Registry
//! - [`GoalRepository`] - Monthly goals
//! - [`TransferRepository`] - Transfer requests and their decision
//! - [`ForecastRepository`] - Weekly demand forecasts
//! - [`MetricsRepository`] - The materialized dashboard snapshot

pub mod dealership;
pub mod forecast;
pub mod goal;
pub mod metrics;
pub mod sale;
pub mod transfer;
pub mod user;
pub mod vehicle;

pub use dealership::DealershipRepository;
pub use forecast::ForecastRepository;
pub use goal::GoalRepository;
pub use metrics::MetricsRepository;
pub use sale::SaleRepository;
pub use transfer::TransferRepository;
pub use user::UserRepository;
pub use vehicle::VehicleRepository;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};
    use dealernet_core::{Dealership, Role, User, Vehicle, VehicleHistoryEntry, VehicleStatus};

    use crate::pool::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, 12, 0, 0).unwrap()
    }

    pub fn dealership(id: &str, province: &str) -> Dealership {
        Dealership {
            id: id.to_string(),
            name: format!("Dealer {}", id),
            city: "City".to_string(),
            province: province.to_string(),
            coords: Default::default(),
        }
    }

    pub fn user(id: &str, role: Role, dealership: Option<&str>) -> User {
        User {
            id: id.to_string(),
            username: id.to_string(),
            name: format!("User {}", id),
            role,
            dealership_id: dealership.map(str::to_string),
            commission_rate_bps: (role == Role::Salesperson).then_some(1000),
        }
    }

    pub fn vehicle(vin: &str, status: VehicleStatus, dealership: Option<&str>) -> Vehicle {
        Vehicle {
            vin: vin.to_string(),
            model: "Ranger".to_string(),
            color: "Blue".to_string(),
            year: 2024,
            cost_price_cents: 2_000_000,
            status,
            dealership_id: dealership.map(str::to_string),
            history: vec![VehicleHistoryEntry {
                status,
                date: at(1),
            }],
            estimated_arrival_date: None,
            current_location: None,
        }
    }

    /// Two dealerships, an admin at each, a salesperson at d-1, a factory
    /// user, and one in-stock vehicle per dealership.
    pub async fn seeded() -> Database {
        let db = database().await;
        db.dealerships().insert(&dealership("d-1", "Ontario")).await.unwrap();
        db.dealerships().insert(&dealership("d-2", "Alberta")).await.unwrap();
        for u in [
            user("admin-1", Role::DealershipAdmin, Some("d-1")),
            user("admin-2", Role::DealershipAdmin, Some("d-2")),
            user("sp-1", Role::Salesperson, Some("d-1")),
            user("factory", Role::Factory, None),
        ] {
            db.users().insert(&u).await.unwrap();
        }
        db.vehicles()
            .insert(&vehicle("VIN0001", VehicleStatus::InStock, Some("d-1")))
            .await
            .unwrap();
        db.vehicles()
            .insert(&vehicle("VIN0002", VehicleStatus::InStock, Some("d-2")))
            .await
            .unwrap();
        db
    }
}

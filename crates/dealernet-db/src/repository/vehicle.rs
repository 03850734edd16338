//! # Vehicle Repository
//!
//! Vehicles are keyed by VIN.
//!
//! ## Inventory Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  register()         ──► At-Factory                                     │
//! │  assign_many()      ──► In-Transit   (one batch, all or nothing)       │
//! │  accept_delivery()  ──► In-Stock                                       │
//! │  SaleRepository::record()       ──► Sold                               │
//! │  TransferRepository::decide()   ──► Transferring                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Every status change is a version-checked write; a lost race is retried
//! against the fresh document.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use dealernet_core::inventory::{self, NewVehicle};
use dealernet_core::{CoreError, Dealership, User, ValidationError, Vehicle};

use crate::document::{Collection, DocumentStore, Versioned, WriteBatch, MAX_CAS_ATTEMPTS};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct VehicleRepository {
    store: DocumentStore,
}

impl VehicleRepository {
    pub fn new(store: DocumentStore) -> Self {
        VehicleRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Vehicle>> {
        self.store.get_all(Collection::Vehicles).await
    }

    pub async fn get(&self, vin: &str) -> DbResult<Option<Vehicle>> {
        self.store
            .get(Collection::Vehicles, &inventory::normalize_vin(vin))
            .await
    }

    pub async fn get_versioned(&self, vin: &str) -> DbResult<Option<Versioned<Vehicle>>> {
        self.store
            .get_versioned(Collection::Vehicles, &inventory::normalize_vin(vin))
            .await
    }

    async fn require_versioned(&self, vin: &str) -> DbResult<Versioned<Vehicle>> {
        self.get_versioned(vin)
            .await?
            .ok_or_else(|| CoreError::VehicleNotFound(vin.to_string()).into())
    }

    /// Stores a new vehicle. A VIN that already exists is a validation error.
    pub async fn insert(&self, vehicle: &Vehicle) -> DbResult<()> {
        let mut batch = WriteBatch::new();
        batch.insert(Collection::Vehicles, &vehicle.vin, vehicle)?;
        self.store.commit(batch).await.map_err(|e| match e {
            DbError::UniqueViolation { .. } => CoreError::from(ValidationError::Duplicate {
                field: "vin".to_string(),
                value: vehicle.vin.clone(),
            })
            .into(),
            other => other,
        })
    }

    /// Factory intake. The caller must be a factory user.
    pub async fn register(
        &self,
        actor: &User,
        input: &NewVehicle,
        now: DateTime<Utc>,
    ) -> DbResult<Vehicle> {
        inventory::ensure_factory(actor, "register vehicles")?;
        let vehicle = inventory::register_vehicle(input, now)?;

        let existing = self.get(&vehicle.vin).await?;
        inventory::ensure_unique_vin(&vehicle.vin, existing.as_ref())?;

        self.insert(&vehicle).await?;
        info!(vin = %vehicle.vin, model = %vehicle.model, "Vehicle registered");
        Ok(vehicle)
    }

    /// Ships factory vehicles to a dealership. Either every VIN moves or
    /// none does.
    pub async fn assign_many(
        &self,
        actor: &User,
        vins: &[String],
        dealership_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<Vehicle>> {
        inventory::ensure_factory(actor, "assign vehicles")?;
        if vins.is_empty() {
            return Err(CoreError::from(ValidationError::required("vins")).into());
        }

        let dealership: Option<Dealership> =
            self.store.get(Collection::Dealerships, dealership_id).await?;
        if dealership.is_none() {
            return Err(CoreError::DealershipNotFound(dealership_id.to_string()).into());
        }

        // A VIN listed twice would fail its own version check
        let mut seen = HashSet::new();
        let vins: Vec<String> = vins
            .iter()
            .map(|vin| inventory::normalize_vin(vin))
            .filter(|vin| seen.insert(vin.clone()))
            .collect();

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let mut batch = WriteBatch::new();
            let mut shipped = Vec::with_capacity(vins.len());

            for vin in &vins {
                let current = self.require_versioned(vin).await?;
                let next = inventory::assign_to_dealership(&current.value, dealership_id, now)?;
                batch.replace_if_version(Collection::Vehicles, &next.vin, &next, current.version)?;
                shipped.push(next);
            }

            match self.store.commit(batch).await {
                Ok(()) => {
                    info!(count = shipped.len(), dealership_id, "Vehicles assigned");
                    return Ok(shipped);
                }
                Err(e) if e.is_conflict() => {
                    warn!(attempt, dealership_id, "Assignment raced another write, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DbError::conflict(Collection::Vehicles.as_str(), dealership_id))
    }

    /// The receiving admin puts an incoming vehicle into stock.
    pub async fn accept_delivery(
        &self,
        receiver: &User,
        vin: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Vehicle> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let current = self.require_versioned(vin).await?;
            let received = inventory::accept_delivery(&current.value, receiver, now)?;

            let mut batch = WriteBatch::new();
            batch.replace_if_version(
                Collection::Vehicles,
                &received.vin,
                &received,
                current.version,
            )?;

            match self.store.commit(batch).await {
                Ok(()) => {
                    debug!(vin = %received.vin, "Delivery accepted");
                    return Ok(received);
                }
                Err(e) if e.is_conflict() => {
                    warn!(attempt, vin, "Delivery raced another write, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DbError::conflict(Collection::Vehicles.as_str(), vin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{at, seeded, user, vehicle};
    use dealernet_core::{Role, VehicleStatus};

    fn intake(vin: &str) -> NewVehicle {
        NewVehicle {
            vin: vin.to_string(),
            model: "Bronco".to_string(),
            color: "Red".to_string(),
            year: 2024,
            cost_price_cents: 4_200_000,
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_and_rejects_duplicates() {
        let db = seeded().await;
        let factory = user("factory", Role::Factory, None);

        let vehicle = db
            .vehicles()
            .register(&factory, &intake(" vin0100 "), at(2))
            .await
            .unwrap();
        assert_eq!(vehicle.vin, "VIN0100");
        assert_eq!(vehicle.status, VehicleStatus::AtFactory);

        let err = db
            .vehicles()
            .register(&factory, &intake("VIN0100"), at(2))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));

        let admin = user("admin-1", Role::DealershipAdmin, Some("d-1"));
        assert!(matches!(
            db.vehicles().register(&admin, &intake("VIN0101"), at(2)).await,
            Err(DbError::Core(CoreError::NotAuthorized { .. }))
        ));
    }

    #[tokio::test]
    async fn test_assign_many_is_all_or_nothing() {
        let db = seeded().await;
        let factory = user("factory", Role::Factory, None);
        db.vehicles()
            .insert(&vehicle("VIN0100", VehicleStatus::AtFactory, None))
            .await
            .unwrap();

        // VIN0001 is already in stock, so the whole assignment fails
        let vins = vec!["VIN0100".to_string(), "VIN0001".to_string()];
        let err = db
            .vehicles()
            .assign_many(&factory, &vins, "d-2", at(3))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidVehicleStatus { .. })));
        let untouched = db.vehicles().get("VIN0100").await.unwrap().unwrap();
        assert_eq!(untouched.status, VehicleStatus::AtFactory);

        let shipped = db
            .vehicles()
            .assign_many(&factory, &vins[..1], "d-2", at(3))
            .await
            .unwrap();
        assert_eq!(shipped[0].status, VehicleStatus::InTransit);
        assert_eq!(shipped[0].dealership_id.as_deref(), Some("d-2"));

        assert!(matches!(
            db.vehicles().assign_many(&factory, &vins[..1], "d-9", at(3)).await,
            Err(DbError::Core(CoreError::DealershipNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_accept_delivery() {
        let db = seeded().await;
        db.vehicles()
            .insert(&vehicle("VIN0100", VehicleStatus::InTransit, Some("d-2")))
            .await
            .unwrap();

        let wrong_admin = user("admin-1", Role::DealershipAdmin, Some("d-1"));
        assert!(db
            .vehicles()
            .accept_delivery(&wrong_admin, "VIN0100", at(4))
            .await
            .is_err());

        let admin = user("admin-2", Role::DealershipAdmin, Some("d-2"));
        let received = db
            .vehicles()
            .accept_delivery(&admin, "vin0100", at(4))
            .await
            .unwrap();
        assert_eq!(received.status, VehicleStatus::InStock);
        assert_eq!(received.history.len(), 2);
    }
}

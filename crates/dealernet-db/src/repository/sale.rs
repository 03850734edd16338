//! # Sale Repository
//!
//! Database operations for sales.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. READ     seller (users/{id}), vehicle (vehicles/{vin}) @ version n  │
//! │  2. RULES    dealernet_core::sale::record_sale → (Sale, Sold vehicle)  │
//! │  3. WRITE    one batch:                                                │
//! │                insert  sales/{uuid}                                    │
//! │                replace vehicles/{vin} if version == n                  │
//! │  4. RACE     version moved → back to 1 (another sale wins, this one   │
//! │              then fails with InvalidVehicleStatus)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Profit and commission are frozen on the sale record; later changes to
//! the seller's rate or the vehicle's cost do not touch past sales.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use dealernet_core::inventory::normalize_vin;
use dealernet_core::sale::{record_sale, NewSale};
use dealernet_core::{CoreError, Sale, User, Vehicle};

use crate::document::{Collection, DocumentStore, Versioned, WriteBatch, MAX_CAS_ATTEMPTS};
use crate::error::{DbError, DbResult};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    store: DocumentStore,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(store: DocumentStore) -> Self {
        SaleRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        self.store.get_all(Collection::Sales).await
    }

    /// Gets a sale by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        self.store.get(Collection::Sales, id).await
    }

    /// Records a sale by `seller_id` and marks the vehicle sold, atomically.
    pub async fn record(
        &self,
        seller_id: &str,
        input: &NewSale,
        now: DateTime<Utc>,
    ) -> DbResult<Sale> {
        input.validate()?;

        let seller: User = self
            .store
            .get(Collection::Users, seller_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(seller_id.to_string()))?;
        let vin = normalize_vin(&input.vehicle_id);

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let vehicle: Versioned<Vehicle> = self
                .store
                .get_versioned(Collection::Vehicles, &vin)
                .await?
                .ok_or_else(|| CoreError::VehicleNotFound(vin.clone()))?;

            let (sale, sold) = record_sale(&vehicle.value, &seller, input, now)?;

            let mut batch = WriteBatch::new();
            batch
                .insert(Collection::Sales, &sale.id, &sale)?
                .replace_if_version(Collection::Vehicles, &sold.vin, &sold, vehicle.version)?;

            match self.store.commit(batch).await {
                Ok(()) => {
                    info!(
                        sale_id = %sale.id,
                        vin = %sale.vehicle_id,
                        dealership_id = %sale.dealership_id,
                        profit_cents = sale.profit_cents,
                        "Sale recorded"
                    );
                    return Ok(sale);
                }
                Err(e) if e.is_conflict() => {
                    warn!(attempt, vin = %vin, "Vehicle changed during sale, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DbError::conflict(Collection::Vehicles.as_str(), vin))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

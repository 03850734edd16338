//! Vehicle lifecycle operations.
//!
//! ```text
//! addVehicle ──► At-Factory ──assignVehicles──► In-Transit ──acceptDelivery──► In-Stock
//!                                                                                 │
//!                                                              createSale ◄───────┘
//!                                                                  │
//!                                                                  ▼
//!                                                                Sold
//! ```
//!
//! Every write here lands in a watched collection, so the dashboard snapshot
//! follows without the caller doing anything.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use dealernet_core::inventory::NewVehicle;
use dealernet_core::sale::NewSale;
use dealernet_core::{Sale, Vehicle};

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::services::caller_user;
use crate::AppState;

/// Body of `assignVehicles`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVehiclesRequest {
    pub vins: Vec<String>,
    pub dealership_id: String,
}

/// Body of `acceptDelivery`.
#[derive(Debug, Clone, Deserialize)]
pub struct AcceptDeliveryRequest {
    pub vin: String,
}

/// Inventory service implementation.
pub struct InventoryService {
    state: Arc<AppState>,
}

impl InventoryService {
    pub fn new(state: Arc<AppState>) -> Self {
        InventoryService { state }
    }

    /// The caller is recorded as the seller.
    pub async fn create_sale(
        &self,
        caller: &Caller,
        input: &NewSale,
        now: DateTime<Utc>,
    ) -> ApiResult<Sale> {
        Ok(self
            .state
            .db
            .sales()
            .record(&caller.user_id, input, now)
            .await?)
    }

    pub async fn add_vehicle(
        &self,
        caller: &Caller,
        input: &NewVehicle,
        now: DateTime<Utc>,
    ) -> ApiResult<Vehicle> {
        let actor = caller_user(&self.state.db, caller).await?;
        Ok(self.state.db.vehicles().register(&actor, input, now).await?)
    }

    pub async fn assign_vehicles(
        &self,
        caller: &Caller,
        request: &AssignVehiclesRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<Vehicle>> {
        let actor = caller_user(&self.state.db, caller).await?;
        Ok(self
            .state
            .db
            .vehicles()
            .assign_many(&actor, &request.vins, &request.dealership_id, now)
            .await?)
    }

    pub async fn accept_delivery(
        &self,
        caller: &Caller,
        request: &AcceptDeliveryRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<Vehicle> {
        let receiver = caller_user(&self.state.db, caller).await?;
        Ok(self
            .state
            .db
            .vehicles()
            .accept_delivery(&receiver, &request.vin, now)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support::{at, caller, state};
    use dealernet_core::{CustomerDetails, VehicleStatus};

    fn intake(vin: &str) -> NewVehicle {
        NewVehicle {
            vin: vin.to_string(),
            model: "Mustang Mach-E".to_string(),
            color: "Grabber Blue".to_string(),
            year: 2024,
            cost_price_cents: 4_000_000,
        }
    }

    #[tokio::test]
    async fn test_factory_to_sale() {
        let state = state().await;
        let service = InventoryService::new(state.clone());
        let factory = caller("factory");

        let added = service.add_vehicle(&factory, &intake("vin0009"), at(6, 1)).await.unwrap();
        assert_eq!(added.vin, "VIN0009");
        assert_eq!(added.status, VehicleStatus::AtFactory);

        let assigned = service
            .assign_vehicles(
                &factory,
                &AssignVehiclesRequest {
                    vins: vec!["VIN0009".to_string()],
                    dealership_id: "d-1".to_string(),
                },
                at(6, 2),
            )
            .await
            .unwrap();
        assert_eq!(assigned[0].status, VehicleStatus::InTransit);

        let received = service
            .accept_delivery(
                &caller("admin-1"),
                &AcceptDeliveryRequest {
                    vin: "VIN0009".to_string(),
                },
                at(6, 5),
            )
            .await
            .unwrap();
        assert_eq!(received.status, VehicleStatus::InStock);
        assert_eq!(received.history.len(), 3);

        let sale = service
            .create_sale(
                &caller("sp-1"),
                &NewSale {
                    vehicle_id: "VIN0009".to_string(),
                    customer: CustomerDetails {
                        first_name: "Ana".to_string(),
                        last_name: "Diaz".to_string(),
                        ..Default::default()
                    },
                    sale_price_cents: 5_000_000,
                    financing_income_cents: 0,
                    insurance_income_cents: 0,
                },
                at(6, 8),
            )
            .await
            .unwrap();
        assert_eq!(sale.dealership_id, "d-1");
        assert_eq!(sale.profit_cents, 1_000_000);

        let sold = state.db.vehicles().get("VIN0009").await.unwrap().unwrap();
        assert_eq!(sold.status, VehicleStatus::Sold);
    }

    #[tokio::test]
    async fn test_dealers_cannot_add_vehicles() {
        let state = state().await;
        let service = InventoryService::new(state);

        assert!(matches!(
            service.add_vehicle(&caller("admin-1"), &intake("VIN0010"), at(6, 1)).await,
            Err(ApiError::PermissionDenied(_))
        ));
        assert!(matches!(
            service.add_vehicle(&caller("factory"), &intake("VIN0001"), at(6, 1)).await,
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_accept_requires_incoming_vehicle() {
        let state = state().await;
        let service = InventoryService::new(state);

        assert!(matches!(
            service
                .accept_delivery(
                    &caller("admin-1"),
                    &AcceptDeliveryRequest {
                        vin: "VIN0001".to_string(),
                    },
                    at(6, 1),
                )
                .await,
            Err(ApiError::FailedPrecondition(_))
        ));
    }
}

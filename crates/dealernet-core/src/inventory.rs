//! # Inventory Lifecycle
//!
//! Factory intake, dealership assignment and delivery acceptance. Every
//! transition appends to the vehicle's history through
//! [`Vehicle::record_status`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Role, User, Vehicle, VehicleHistoryEntry, VehicleStatus};
use crate::validation::{validate_amount, validate_model_year, validate_name, validate_vin};

/// Factory intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    pub vin: String,
    pub model: String,
    pub color: String,
    pub year: i32,
    pub cost_price_cents: i64,
}

/// VINs are stored trimmed and uppercase.
pub fn normalize_vin(vin: &str) -> String {
    vin.trim().to_ascii_uppercase()
}

/// Fails when a vehicle with the same VIN is already stored.
pub fn ensure_unique_vin(vin: &str, existing: Option<&Vehicle>) -> CoreResult<()> {
    match existing {
        Some(_) => Err(ValidationError::Duplicate {
            field: "vin".to_string(),
            value: vin.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

/// Only factory users manage factory inventory.
pub fn ensure_factory(user: &User, action: &str) -> CoreResult<()> {
    if user.role != Role::Factory {
        return Err(CoreError::not_authorized(&user.id, action));
    }
    Ok(())
}

/// Builds a new vehicle at the factory with a single history entry.
pub fn register_vehicle(input: &NewVehicle, now: DateTime<Utc>) -> CoreResult<Vehicle> {
    validate_vin(&input.vin)?;
    validate_name("model", &input.model)?;
    validate_name("color", &input.color)?;
    validate_model_year(input.year)?;
    validate_amount("costPriceCents", input.cost_price_cents)?;

    Ok(Vehicle {
        vin: normalize_vin(&input.vin),
        model: input.model.trim().to_string(),
        color: input.color.trim().to_string(),
        year: input.year,
        cost_price_cents: input.cost_price_cents,
        status: VehicleStatus::AtFactory,
        dealership_id: None,
        history: vec![VehicleHistoryEntry {
            status: VehicleStatus::AtFactory,
            date: now,
        }],
        estimated_arrival_date: None,
        current_location: None,
    })
}

/// Ships a factory vehicle to `dealership_id`.
pub fn assign_to_dealership(
    vehicle: &Vehicle,
    dealership_id: &str,
    now: DateTime<Utc>,
) -> CoreResult<Vehicle> {
    if vehicle.status != VehicleStatus::AtFactory {
        return Err(CoreError::invalid_vehicle_status(
            &vehicle.vin,
            vehicle.status,
            "assign to a dealership",
        ));
    }

    let mut shipped = vehicle.clone();
    shipped.dealership_id = Some(dealership_id.to_string());
    shipped.record_status(VehicleStatus::InTransit, now);
    Ok(shipped)
}

/// The receiving dealership's admin puts an incoming vehicle into stock.
///
/// Accepts vehicles that are in transit from the factory, already marked
/// as arrived, or coming in through an approved transfer.
pub fn accept_delivery(vehicle: &Vehicle, receiver: &User, now: DateTime<Utc>) -> CoreResult<Vehicle> {
    let incoming = matches!(
        vehicle.status,
        VehicleStatus::InTransit | VehicleStatus::Arrived | VehicleStatus::Transferring
    );
    if !incoming {
        return Err(CoreError::invalid_vehicle_status(
            &vehicle.vin,
            vehicle.status,
            "accept delivery",
        ));
    }

    let at_receiver = vehicle
        .dealership_id
        .as_deref()
        .is_some_and(|id| receiver.is_admin_of(id));
    if !at_receiver {
        return Err(CoreError::not_authorized(&receiver.id, "accept this delivery"));
    }

    let mut received = vehicle.clone();
    received.record_status(VehicleStatus::InStock, now);
    received.estimated_arrival_date = None;
    received.current_location = None;
    Ok(received)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn intake() -> NewVehicle {
        NewVehicle {
            vin: " 1fter4fh5lla12345 ".to_string(),
            model: "Ranger".to_string(),
            color: "Blue".to_string(),
            year: 2024,
            cost_price_cents: 3_500_000,
        }
    }

    #[test]
    fn test_register_vehicle() {
        let vehicle = register_vehicle(&intake(), fixtures::now()).unwrap();
        assert_eq!(vehicle.vin, "1FTER4FH5LLA12345");
        assert_eq!(vehicle.status, VehicleStatus::AtFactory);
        assert!(vehicle.dealership_id.is_none());
        assert_eq!(vehicle.history.len(), 1);
    }

    #[test]
    fn test_duplicate_vin() {
        let existing = register_vehicle(&intake(), fixtures::now()).unwrap();
        let err = ensure_unique_vin(&existing.vin, Some(&existing)).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Duplicate { .. })));
        assert!(ensure_unique_vin("OTHER", None).is_ok());
    }

    #[test]
    fn test_full_lifecycle_to_stock() {
        let now = fixtures::now();
        let admin = fixtures::user("admin-1", "Ana", Role::DealershipAdmin, Some("d-1"));

        let vehicle = register_vehicle(&intake(), now).unwrap();
        let shipped = assign_to_dealership(&vehicle, "d-1", now).unwrap();
        assert_eq!(shipped.status, VehicleStatus::InTransit);
        assert_eq!(shipped.dealership_id.as_deref(), Some("d-1"));

        let stocked = accept_delivery(&shipped, &admin, now).unwrap();
        assert_eq!(stocked.status, VehicleStatus::InStock);
        let statuses: Vec<_> = stocked.history.iter().map(|h| h.status).collect();
        assert_eq!(
            statuses,
            vec![VehicleStatus::AtFactory, VehicleStatus::InTransit, VehicleStatus::InStock]
        );
    }

    #[test]
    fn test_cannot_reassign_shipped_vehicle() {
        let shipped = fixtures::vehicle("VIN1", "Ranger", VehicleStatus::InTransit, Some("d-1"), 1);
        assert!(matches!(
            assign_to_dealership(&shipped, "d-2", fixtures::now()),
            Err(CoreError::InvalidVehicleStatus { .. })
        ));
    }

    #[test]
    fn test_accept_delivery_rules() {
        let other_admin = fixtures::user("admin-2", "Bo", Role::DealershipAdmin, Some("d-2"));
        let admin = fixtures::user("admin-1", "Ana", Role::DealershipAdmin, Some("d-1"));
        let incoming = fixtures::vehicle("VIN1", "Ranger", VehicleStatus::Transferring, Some("d-1"), 1);

        assert!(matches!(
            accept_delivery(&incoming, &other_admin, fixtures::now()),
            Err(CoreError::NotAuthorized { .. })
        ));
        assert!(accept_delivery(&incoming, &admin, fixtures::now()).is_ok());

        let in_stock = fixtures::vehicle("VIN2", "Ranger", VehicleStatus::InStock, Some("d-1"), 1);
        assert!(accept_delivery(&in_stock, &admin, fixtures::now()).is_err());
    }

    #[test]
    fn test_ensure_factory() {
        let factory = fixtures::user("factory", "Fran", Role::Factory, None);
        let seller = fixtures::user("sp-1", "Sam", Role::Salesperson, Some("d-1"));
        assert!(ensure_factory(&factory, "add vehicles").is_ok());
        assert!(ensure_factory(&seller, "add vehicles").is_err());
    }
}

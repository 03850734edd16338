//! # Transfer State Machine
//!
//! Rules for moving a vehicle between dealerships.
//!
//! ```text
//!                 ┌──── approve (source admin) ───► approved   vehicle ► Transferring
//!  pending ───────┤                                            dealership ► destination
//!                 └──── reject + reason ──────────► rejected   vehicle untouched
//!
//!  completed: reserved for the receiving side, never assigned here
//! ```
//!
//! ## Check Order
//! The storage layer reports a missing transfer first. The rules here then
//! run in a fixed order so each failure maps to a distinct error:
//!
//! 1. caller must administer the SOURCE dealership  → `NotAuthorized`
//! 2. transfer must still be pending                → `TransferAlreadyProcessed`
//! 3. on approval the vehicle must exist            → `VehicleNotFound`
//!
//! Everything is computed on copies; nothing is written unless every check
//! passes.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Role, TransferRequest, TransferStatus, User, Vehicle, VehicleStatus};
use crate::validation::validate_rejection_reason;
use crate::{TRANSFER_ORIGIN_LOCATION, TRANSFER_TRANSIT_DAYS};

/// What the source dealership's admin decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferDecision {
    Approve,
    Reject { reason: String },
}

impl TransferDecision {
    /// Builds a decision from the requested status. Rejections need a reason.
    pub fn from_request(
        status: TransferStatus,
        rejection_reason: Option<&str>,
    ) -> Result<Self, ValidationError> {
        match status {
            TransferStatus::Approved => Ok(TransferDecision::Approve),
            TransferStatus::Rejected => Ok(TransferDecision::Reject {
                reason: validate_rejection_reason(rejection_reason)?,
            }),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["approved".to_string(), "rejected".to_string()],
            }),
        }
    }

    pub fn target_status(&self) -> TransferStatus {
        match self {
            TransferDecision::Approve => TransferStatus::Approved,
            TransferDecision::Reject { .. } => TransferStatus::Rejected,
        }
    }
}

/// New state of the documents touched by a decision.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub transfer: TransferRequest,
    /// Only set on approval.
    pub vehicle: Option<Vehicle>,
}

/// Only an admin of the source dealership may decide.
pub fn authorize_decision(
    transfer: &TransferRequest,
    caller_id: &str,
    caller: Option<&User>,
) -> CoreResult<()> {
    match caller {
        Some(user) if user.is_admin_of(&transfer.from_dealership_id) => Ok(()),
        _ => Err(CoreError::not_authorized(caller_id, "decide this transfer request")),
    }
}

pub fn ensure_pending(transfer: &TransferRequest) -> CoreResult<()> {
    if transfer.status != TransferStatus::Pending {
        return Err(CoreError::TransferAlreadyProcessed {
            transfer_id: transfer.id.clone(),
            status: transfer.status.to_string(),
        });
    }
    Ok(())
}

/// Applies `decision` to a transfer and, on approval, its vehicle.
pub fn apply_decision(
    transfer: &TransferRequest,
    vehicle: Option<&Vehicle>,
    caller_id: &str,
    caller: Option<&User>,
    decision: &TransferDecision,
    now: DateTime<Utc>,
) -> CoreResult<TransferOutcome> {
    authorize_decision(transfer, caller_id, caller)?;
    ensure_pending(transfer)?;

    let mut updated = transfer.clone();
    updated.status = decision.target_status();
    updated.updated_at = now;

    match decision {
        TransferDecision::Approve => {
            let mut vehicle = vehicle
                .cloned()
                .ok_or_else(|| CoreError::VehicleNotFound(transfer.vehicle_id.clone()))?;

            vehicle.record_status(VehicleStatus::Transferring, now);
            vehicle.dealership_id = Some(transfer.to_dealership_id.clone());
            vehicle.estimated_arrival_date = Some(now + Duration::days(TRANSFER_TRANSIT_DAYS));
            vehicle.current_location = Some(TRANSFER_ORIGIN_LOCATION.to_string());

            updated.approved_by_user_id = Some(caller_id.to_string());
            Ok(TransferOutcome {
                transfer: updated,
                vehicle: Some(vehicle),
            })
        }
        TransferDecision::Reject { reason } => {
            updated.rejection_reason = Some(reason.clone());
            Ok(TransferOutcome {
                transfer: updated,
                vehicle: None,
            })
        }
    }
}

/// Opens a pending request for `vehicle` on behalf of `requester`, an admin
/// of the destination dealership.
pub fn new_transfer_request(
    requester: &User,
    vehicle: &Vehicle,
    now: DateTime<Utc>,
) -> CoreResult<TransferRequest> {
    let destination = match (requester.role, requester.dealership_id.as_deref()) {
        (Role::DealershipAdmin, Some(id)) => id,
        _ => {
            return Err(CoreError::not_authorized(
                &requester.id,
                "request vehicle transfers",
            ))
        }
    };

    let source = match (vehicle.status, vehicle.dealership_id.as_deref()) {
        (VehicleStatus::InStock, Some(id)) => id,
        _ => {
            return Err(CoreError::invalid_vehicle_status(
                &vehicle.vin,
                vehicle.status,
                "request a transfer",
            ))
        }
    };

    if source == destination {
        return Err(ValidationError::InvalidFormat {
            field: "vehicleId".to_string(),
            reason: "vehicle is already at the requesting dealership".to_string(),
        }
        .into());
    }

    Ok(TransferRequest {
        id: Uuid::new_v4().to_string(),
        vehicle_id: vehicle.vin.clone(),
        from_dealership_id: source.to_string(),
        to_dealership_id: destination.to_string(),
        requesting_user_id: requester.id.clone(),
        status: TransferStatus::Pending,
        created_at: now,
        updated_at: now,
        approved_by_user_id: None,
        rejection_reason: None,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

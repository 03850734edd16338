//! # Transfer Repository
//!
//! Transfer requests and the status transaction that decides them.
//!
//! ## Decision Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  decide(transfer_id, caller_id, decision)                               │
//! │                                                                         │
//! │  ┌─► read transfer @ v1 ─────────── missing ──► TransferNotFound       │
//! │  │   read caller                                                        │
//! │  │   read vehicle @ v2 (approve only)                                   │
//! │  │        │                                                             │
//! │  │        ▼                                                             │
//! │  │   apply_decision ──── not source admin ──► NotAuthorized            │
//! │  │        │        └──── not pending ───────► TransferAlreadyProcessed │
//! │  │        ▼                                                             │
//! │  │   commit { transfer if v1, vehicle if v2 }                           │
//! │  │        │                                                             │
//! │  └────────┴── Conflict (someone else wrote) ── re-read and re-check    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two admins approving the same request at once: both read `pending`, one
//! commit lands, the other hits the version check, re-reads, and fails the
//! pending check. The vehicle gets exactly one `Transferring` entry.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use dealernet_core::inventory::normalize_vin;
use dealernet_core::transfer::{apply_decision, new_transfer_request, TransferDecision};
use dealernet_core::{CoreError, TransferRequest, User, Vehicle};

use crate::document::{Collection, DocumentStore, Versioned, WriteBatch, MAX_CAS_ATTEMPTS};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct TransferRepository {
    store: DocumentStore,
}

impl TransferRepository {
    pub fn new(store: DocumentStore) -> Self {
        TransferRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<TransferRequest>> {
        self.store.get_all(Collection::TransferRequests).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<TransferRequest>> {
        self.store.get(Collection::TransferRequests, id).await
    }

    /// Opens a pending request on behalf of an admin of the destination.
    pub async fn create(
        &self,
        requester: &User,
        vehicle_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<TransferRequest> {
        let vin = normalize_vin(vehicle_id);
        let vehicle: Vehicle = self
            .store
            .get(Collection::Vehicles, &vin)
            .await?
            .ok_or_else(|| CoreError::VehicleNotFound(vin.clone()))?;

        let request = new_transfer_request(requester, &vehicle, now)?;

        let mut batch = WriteBatch::new();
        batch.insert(Collection::TransferRequests, &request.id, &request)?;
        self.store.commit(batch).await?;

        info!(
            transfer_id = %request.id,
            vin = %request.vehicle_id,
            from = %request.from_dealership_id,
            to = %request.to_dealership_id,
            "Transfer requested"
        );
        Ok(request)
    }

    /// Approves or rejects a pending request as one atomic read-modify-write
    /// over the request and, on approval, its vehicle.
    pub async fn decide(
        &self,
        transfer_id: &str,
        caller_id: &str,
        decision: &TransferDecision,
        now: DateTime<Utc>,
    ) -> DbResult<TransferRequest> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let transfer: Versioned<TransferRequest> = self
                .store
                .get_versioned(Collection::TransferRequests, transfer_id)
                .await?
                .ok_or_else(|| CoreError::TransferNotFound(transfer_id.to_string()))?;

            let caller: Option<User> = self.store.get(Collection::Users, caller_id).await?;

            let vehicle: Option<Versioned<Vehicle>> = match decision {
                TransferDecision::Approve => {
                    self.store
                        .get_versioned(Collection::Vehicles, &transfer.value.vehicle_id)
                        .await?
                }
                TransferDecision::Reject { .. } => None,
            };

            let outcome = apply_decision(
                &transfer.value,
                vehicle.as_ref().map(|v| &v.value),
                caller_id,
                caller.as_ref(),
                decision,
                now,
            )?;

            let mut batch = WriteBatch::new();
            batch.replace_if_version(
                Collection::TransferRequests,
                transfer_id,
                &outcome.transfer,
                transfer.version,
            )?;
            if let (Some(updated), Some(read)) = (&outcome.vehicle, &vehicle) {
                batch.replace_if_version(
                    Collection::Vehicles,
                    &updated.vin,
                    updated,
                    read.version,
                )?;
            }

            match self.store.commit(batch).await {
                Ok(()) => {
                    info!(
                        transfer_id,
                        caller_id,
                        status = %outcome.transfer.status,
                        "Transfer decided"
                    );
                    return Ok(outcome.transfer);
                }
                Err(e) if e.is_conflict() => {
                    warn!(attempt, transfer_id, "Transfer changed during decision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DbError::conflict(
            Collection::TransferRequests.as_str(),
            transfer_id,
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{at, seeded, user};
    use dealernet_core::{Role, TransferStatus, VehicleStatus};

    /// admin-2 (d-2) asks for VIN0001, which sits at d-1.
    async fn pending() -> (crate::Database, TransferRequest) {
        let db = seeded().await;
        let requester = user("admin-2", Role::DealershipAdmin, Some("d-2"));
        let request = db.transfers().create(&requester, "VIN0001", at(5)).await.unwrap();
        (db, request)
    }

    #[tokio::test]
    async fn test_create_request() {
        let (db, request) = pending().await;
        assert_eq!(request.status, TransferStatus::Pending);
        assert_eq!(request.from_dealership_id, "d-1");
        assert_eq!(request.to_dealership_id, "d-2");
        assert_eq!(db.transfers().list().await.unwrap(), vec![request]);

        let own = user("admin-1", Role::DealershipAdmin, Some("d-1"));
        assert!(db.transfers().create(&own, "VIN0001", at(5)).await.is_err());
    }

    #[tokio::test]
    async fn test_approve_moves_vehicle() {
        let (db, request) = pending().await;

        let decided = db
            .transfers()
            .decide(&request.id, "admin-1", &TransferDecision::Approve, at(6))
            .await
            .unwrap();
        assert_eq!(decided.status, TransferStatus::Approved);
        assert_eq!(decided.approved_by_user_id.as_deref(), Some("admin-1"));

        let vehicle = db.vehicles().get("VIN0001").await.unwrap().unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Transferring);
        assert_eq!(vehicle.dealership_id.as_deref(), Some("d-2"));
        assert_eq!(vehicle.history.last().unwrap().date, at(6));
    }

    #[tokio::test]
    async fn test_reject_leaves_vehicle_alone() {
        let (db, request) = pending().await;
        let before = db.vehicles().get("VIN0001").await.unwrap().unwrap();

        let decision = TransferDecision::Reject {
            reason: "Needed for a test drive".to_string(),
        };
        let decided = db
            .transfers()
            .decide(&request.id, "admin-1", &decision, at(6))
            .await
            .unwrap();
        assert_eq!(decided.status, TransferStatus::Rejected);
        assert_eq!(decided.rejection_reason.as_deref(), Some("Needed for a test drive"));

        let after = db.vehicles().get("VIN0001").await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_error_kinds_are_distinct() {
        let (db, request) = pending().await;

        assert!(matches!(
            db.transfers()
                .decide("missing", "admin-1", &TransferDecision::Approve, at(6))
                .await,
            Err(DbError::Core(CoreError::TransferNotFound(_)))
        ));

        // admin-2 is the requester, not the source admin
        assert!(matches!(
            db.transfers()
                .decide(&request.id, "admin-2", &TransferDecision::Approve, at(6))
                .await,
            Err(DbError::Core(CoreError::NotAuthorized { .. }))
        ));

        // Unknown caller
        assert!(matches!(
            db.transfers()
                .decide(&request.id, "ghost", &TransferDecision::Approve, at(6))
                .await,
            Err(DbError::Core(CoreError::NotAuthorized { .. }))
        ));

        db.transfers()
            .decide(&request.id, "admin-1", &TransferDecision::Approve, at(6))
            .await
            .unwrap();
        assert!(matches!(
            db.transfers()
                .decide(&request.id, "admin-1", &TransferDecision::Approve, at(7))
                .await,
            Err(DbError::Core(CoreError::TransferAlreadyProcessed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_approvals_succeed_once() {
        let (db, request) = pending().await;
        let history_before = db
            .vehicles()
            .get("VIN0001")
            .await
            .unwrap()
            .unwrap()
            .history
            .len();

        let first = db.transfers();
        let second = db.transfers();
        let (a, b) = tokio::join!(
            first.decide(&request.id, "admin-1", &TransferDecision::Approve, at(6)),
            second.decide(&request.id, "admin-1", &TransferDecision::Approve, at(6)),
        );

        let results = [a, b];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let already = results
            .iter()
            .filter(|r| matches!(r, Err(DbError::Core(CoreError::TransferAlreadyProcessed { .. }))))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(already, 1);

        let vehicle = db.vehicles().get("VIN0001").await.unwrap().unwrap();
        assert_eq!(vehicle.history.len(), history_before + 1);
    }
}

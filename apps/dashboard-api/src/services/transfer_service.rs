//! Transfer requests between dealerships.
//!
//! ## Decision Flow
//! ```text
//! updateTransferStatus { transferId, status, rejectionReason? }
//!        │
//!        ├─ validate body ─────────────────────► invalid-argument
//!        │
//!        ▼
//! TransferRepository::decide  (compare-and-swap, retried)
//!        ├─ request missing ──────────────────► not-found
//!        ├─ caller not source admin ──────────► permission-denied
//!        ├─ no longer pending ────────────────► failed-precondition
//!        ▼
//! { success: true, newStatus }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dealernet_core::transfer::TransferDecision;
use dealernet_core::{TransferRequest, TransferStatus, ValidationError};

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::services::caller_user;
use crate::AppState;

/// Body of `updateTransferStatus`. Fields are optional so that missing
/// values surface as `invalid-argument` rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransferStatusRequest {
    #[serde(default)]
    pub transfer_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransferStatusResponse {
    pub success: bool,
    pub new_status: TransferStatus,
}

/// Body of `requestTransfer`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTransferRequest {
    pub vehicle_id: String,
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::required(field))
}

fn parse_status(status: &str) -> Result<TransferStatus, ValidationError> {
    match status {
        "approved" => Ok(TransferStatus::Approved),
        "rejected" => Ok(TransferStatus::Rejected),
        _ => Err(ValidationError::NotAllowed {
            field: "status".to_string(),
            allowed: vec!["approved".to_string(), "rejected".to_string()],
        }),
    }
}

/// Transfer service implementation.
pub struct TransferService {
    state: Arc<AppState>,
}

impl TransferService {
    pub fn new(state: Arc<AppState>) -> Self {
        TransferService { state }
    }

    pub async fn update_status(
        &self,
        caller: &Caller,
        request: &UpdateTransferStatusRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<UpdateTransferStatusResponse> {
        let transfer_id = required("transferId", &request.transfer_id)?;
        let status = parse_status(required("status", &request.status)?)?;
        let decision = TransferDecision::from_request(status, request.rejection_reason.as_deref())?;

        let updated = self
            .state
            .db
            .transfers()
            .decide(transfer_id, &caller.user_id, &decision, now)
            .await?;

        Ok(UpdateTransferStatusResponse {
            success: true,
            new_status: updated.status,
        })
    }

    pub async fn request_transfer(
        &self,
        caller: &Caller,
        request: &RequestTransferRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<TransferRequest> {
        let requester = caller_user(&self.state.db, caller).await?;
        Ok(self
            .state
            .db
            .transfers()
            .create(&requester, &request.vehicle_id, now)
            .await?)
    }
}

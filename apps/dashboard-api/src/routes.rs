//! HTTP routes.
//!
//! ```text
//! POST /v1/getDashboardMetrics   ─► MetricsService::dashboard_metrics
//! POST /v1/generateReport        ─► ReportService::generate
//! POST /v1/updateTransferStatus  ─► TransferService::update_status
//! POST /v1/requestTransfer       ─► TransferService::request_transfer
//! POST /v1/createSale            ─► InventoryService::create_sale
//! POST /v1/addVehicle            ─► InventoryService::add_vehicle
//! POST /v1/assignVehicles        ─► InventoryService::assign_vehicles
//! POST /v1/acceptDelivery        ─► InventoryService::accept_delivery
//! POST /v1/createUser            ─► RegistryService::create_user
//! POST /v1/addDealership         ─► RegistryService::add_dealership
//! POST /v1/deleteUser            ─► RegistryService::delete_user
//! POST /v1/removeDealership      ─► RegistryService::remove_dealership
//! POST /v1/setGoal               ─► RegistryService::set_goal
//! GET  /v1/metrics/dashboard     ─► MetricsService::stored_dashboard
//! GET  /health                   ─► HealthService::check
//! ```
//!
//! Every `/v1` route takes a [`Caller`], so a missing or invalid bearer
//! token is rejected before the body is looked at.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use dealernet_core::inventory::NewVehicle;
use dealernet_core::registry::{NewDealership, NewGoal, NewUser};
use dealernet_core::report::ReportRequest;
use dealernet_core::sale::NewSale;
use dealernet_core::{Dealership, Goal, MetricsSnapshot, Sale, TransferRequest, User, Vehicle};

use crate::auth::Caller;
use crate::error::{ApiError, ApiResult};
use crate::services::health_service::{HealthResponse, HealthService};
use crate::services::inventory_service::{
    AcceptDeliveryRequest, AssignVehiclesRequest, InventoryService,
};
use crate::services::metrics_service::MetricsService;
use crate::services::registry_service::{
    DeleteUserRequest, RegistryService, RemoveDealershipRequest,
};
use crate::services::report_service::{ReportResponse, ReportService};
use crate::services::transfer_service::{
    RequestTransferRequest, TransferService, UpdateTransferStatusRequest,
    UpdateTransferStatusResponse,
};
use crate::AppState;

type Body<T> = Result<Json<T>, JsonRejection>;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/getDashboardMetrics", post(get_dashboard_metrics))
        .route("/v1/generateReport", post(generate_report))
        .route("/v1/updateTransferStatus", post(update_transfer_status))
        .route("/v1/requestTransfer", post(request_transfer))
        .route("/v1/createSale", post(create_sale))
        .route("/v1/addVehicle", post(add_vehicle))
        .route("/v1/assignVehicles", post(assign_vehicles))
        .route("/v1/acceptDelivery", post(accept_delivery))
        .route("/v1/createUser", post(create_user))
        .route("/v1/addDealership", post(add_dealership))
        .route("/v1/deleteUser", post(delete_user))
        .route("/v1/removeDealership", post(remove_dealership))
        .route("/v1/setGoal", post(set_goal))
        .route("/v1/metrics/dashboard", get(stored_dashboard))
        .route("/health", get(health))
        .with_state(state)
}

fn body<T>(payload: Body<T>) -> ApiResult<T> {
    payload.map(|Json(value)| value).map_err(ApiError::from)
}

// =============================================================================
// Aggregation
// =============================================================================

async fn get_dashboard_metrics(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
) -> ApiResult<Json<MetricsSnapshot>> {
    MetricsService::new(state).dashboard_metrics(Utc::now()).await.map(Json)
}

async fn stored_dashboard(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
) -> ApiResult<Json<MetricsSnapshot>> {
    MetricsService::new(state).stored_dashboard(Utc::now()).await.map(Json)
}

async fn generate_report(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    payload: Body<ReportRequest>,
) -> ApiResult<Json<ReportResponse>> {
    let request = body(payload)?;
    ReportService::new(state).generate(&request, Utc::now()).await.map(Json)
}

// =============================================================================
// Transfers
// =============================================================================

async fn update_transfer_status(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<UpdateTransferStatusRequest>,
) -> ApiResult<Json<UpdateTransferStatusResponse>> {
    let request = body(payload)?;
    TransferService::new(state)
        .update_status(&caller, &request, Utc::now())
        .await
        .map(Json)
}

async fn request_transfer(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<RequestTransferRequest>,
) -> ApiResult<Json<TransferRequest>> {
    let request = body(payload)?;
    TransferService::new(state)
        .request_transfer(&caller, &request, Utc::now())
        .await
        .map(Json)
}

// =============================================================================
// Inventory
// =============================================================================

async fn create_sale(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<NewSale>,
) -> ApiResult<Json<Sale>> {
    let input = body(payload)?;
    InventoryService::new(state)
        .create_sale(&caller, &input, Utc::now())
        .await
        .map(Json)
}

async fn add_vehicle(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<NewVehicle>,
) -> ApiResult<Json<Vehicle>> {
    let input = body(payload)?;
    InventoryService::new(state)
        .add_vehicle(&caller, &input, Utc::now())
        .await
        .map(Json)
}

async fn assign_vehicles(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<AssignVehiclesRequest>,
) -> ApiResult<Json<Vec<Vehicle>>> {
    let request = body(payload)?;
    InventoryService::new(state)
        .assign_vehicles(&caller, &request, Utc::now())
        .await
        .map(Json)
}

async fn accept_delivery(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<AcceptDeliveryRequest>,
) -> ApiResult<Json<Vehicle>> {
    let request = body(payload)?;
    InventoryService::new(state)
        .accept_delivery(&caller, &request, Utc::now())
        .await
        .map(Json)
}

// =============================================================================
// Registry
// =============================================================================

async fn create_user(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<NewUser>,
) -> ApiResult<Json<User>> {
    let input = body(payload)?;
    RegistryService::new(state).create_user(&caller, &input).await.map(Json)
}

async fn add_dealership(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<NewDealership>,
) -> ApiResult<Json<Dealership>> {
    let input = body(payload)?;
    RegistryService::new(state).add_dealership(&caller, &input).await.map(Json)
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<DeleteUserRequest>,
) -> ApiResult<Json<User>> {
    let request = body(payload)?;
    RegistryService::new(state).delete_user(&caller, &request).await.map(Json)
}

async fn remove_dealership(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<RemoveDealershipRequest>,
) -> ApiResult<Json<Dealership>> {
    let request = body(payload)?;
    RegistryService::new(state)
        .remove_dealership(&caller, &request)
        .await
        .map(Json)
}

async fn set_goal(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    payload: Body<NewGoal>,
) -> ApiResult<Json<Goal>> {
    let input = body(payload)?;
    RegistryService::new(state).set_goal(&caller, &input).await.map(Json)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthService::new(state).check().await)
}

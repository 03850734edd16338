//! Dashboard metrics.
//!
//! `getDashboardMetrics` returns a freshly computed snapshot without storing
//! it; the stored `metrics/dashboard` document is owned by the recompute
//! task and served by `GET /v1/metrics/dashboard`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use dealernet_core::MetricsSnapshot;
use dealernet_db::{Database, DbResult};

use crate::error::ApiResult;
use crate::AppState;

/// Full read of the source collections, then the aggregation pipeline.
pub async fn compute_snapshot(db: &Database, now: DateTime<Utc>) -> DbResult<MetricsSnapshot> {
    let sources = db.source_collections().await?;
    debug!(
        sales = sources.sales.len(),
        vehicles = sources.vehicles.len(),
        "Computing dashboard snapshot"
    );
    Ok(MetricsSnapshot::compute(sources, now))
}

/// Recomputes and replaces the stored snapshot.
pub async fn refresh_dashboard(db: &Database, now: DateTime<Utc>) -> DbResult<MetricsSnapshot> {
    let snapshot = compute_snapshot(db, now).await?;
    db.metrics().put_dashboard(&snapshot).await?;
    info!(
        enriched_sales = snapshot.enriched_sales.len(),
        "Dashboard snapshot updated"
    );
    Ok(snapshot)
}

/// Metrics service implementation.
pub struct MetricsService {
    state: Arc<AppState>,
}

impl MetricsService {
    pub fn new(state: Arc<AppState>) -> Self {
        MetricsService { state }
    }

    pub async fn dashboard_metrics(&self, now: DateTime<Utc>) -> ApiResult<MetricsSnapshot> {
        Ok(compute_snapshot(&self.state.db, now).await?)
    }

    /// The stored snapshot. Computed and stored on first use.
    pub async fn stored_dashboard(&self, now: DateTime<Utc>) -> ApiResult<MetricsSnapshot> {
        match self.state.db.metrics().dashboard().await? {
            Some(snapshot) => Ok(snapshot),
            None => Ok(refresh_dashboard(&self.state.db, now).await?),
        }
    }
}

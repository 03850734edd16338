//! Health check for monitoring and load balancers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use dealernet_db::migrations::migration_status;

use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServingStatus {
    Serving,
    NotServing,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: ServingStatus,
    pub message: String,
    pub migrations_applied: usize,
    pub migrations_total: usize,
    pub server_time: DateTime<Utc>,
}

/// Health service implementation.
pub struct HealthService {
    state: Arc<AppState>,
}

impl HealthService {
    pub fn new(state: Arc<AppState>) -> Self {
        HealthService { state }
    }

    pub async fn check(&self) -> HealthResponse {
        let (status, message) = self.check_database().await;
        let (migrations_total, migrations_applied) = migration_status(self.state.db.pool())
            .await
            .unwrap_or((0, 0));

        HealthResponse {
            status,
            message,
            migrations_applied,
            migrations_total,
            server_time: Utc::now(),
        }
    }

    async fn check_database(&self) -> (ServingStatus, String) {
        if self.state.db.health_check().await {
            (ServingStatus::Serving, "Database connected".to_string())
        } else {
            (ServingStatus::NotServing, "Database unreachable".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state;

    #[tokio::test]
    async fn test_serving_with_migrations_applied() {
        let health = HealthService::new(state().await).check().await;
        assert_eq!(health.status, ServingStatus::Serving);
        assert!(health.migrations_total > 0);
        assert_eq!(health.migrations_applied, health.migrations_total);
    }
}

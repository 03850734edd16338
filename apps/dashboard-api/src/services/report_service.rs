//! CSV report generation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use dealernet_core::report::{generate_report, ReportRequest};

use crate::error::ApiResult;
use crate::AppState;

/// Response of `generateReport`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub csv_string: String,
}

/// Report service implementation.
pub struct ReportService {
    state: Arc<AppState>,
}

impl ReportService {
    pub fn new(state: Arc<AppState>) -> Self {
        ReportService { state }
    }

    pub async fn generate(
        &self,
        request: &ReportRequest,
        now: DateTime<Utc>,
    ) -> ApiResult<ReportResponse> {
        let sources = self.state.db.source_collections().await?;
        let csv_string = generate_report(request, &sources, now)?;

        info!(
            dealerships = request.dealership_ids.len(),
            detailed = request.detailed,
            bytes = csv_string.len(),
            "Report generated"
        );
        Ok(ReportResponse { csv_string })
    }
}

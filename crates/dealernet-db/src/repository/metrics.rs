//! # Metrics Repository
//!
//! The materialized dashboard snapshot lives at `metrics/dashboard` and is
//! always replaced whole.

use tracing::debug;

use dealernet_core::MetricsSnapshot;

use crate::document::{Collection, DocumentStore};
use crate::error::DbResult;

/// Document id of the dashboard snapshot.
pub const DASHBOARD_DOCUMENT_ID: &str = "dashboard";

#[derive(Debug, Clone)]
pub struct MetricsRepository {
    store: DocumentStore,
}

impl MetricsRepository {
    pub fn new(store: DocumentStore) -> Self {
        MetricsRepository { store }
    }

    /// The last stored snapshot, if one was ever computed.
    pub async fn dashboard(&self) -> DbResult<Option<MetricsSnapshot>> {
        self.store
            .get(Collection::Metrics, DASHBOARD_DOCUMENT_ID)
            .await
    }

    pub async fn put_dashboard(&self, snapshot: &MetricsSnapshot) -> DbResult<()> {
        debug!(
            sales = snapshot.enriched_sales.len(),
            last_updated = %snapshot.last_updated,
            "Storing dashboard snapshot"
        );
        self.store
            .set(Collection::Metrics, DASHBOARD_DOCUMENT_ID, snapshot)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{at, seeded};

    #[tokio::test]
    async fn test_snapshot_replaced_whole() {
        let db = seeded().await;
        assert!(db.metrics().dashboard().await.unwrap().is_none());

        let sources = db.source_collections().await.unwrap();
        let first = MetricsSnapshot::compute(sources.clone(), at(10));
        db.metrics().put_dashboard(&first).await.unwrap();

        let mut fewer = sources;
        fewer.vehicles.clear();
        let second = MetricsSnapshot::compute(fewer, at(11));
        db.metrics().put_dashboard(&second).await.unwrap();

        let stored = db.metrics().dashboard().await.unwrap().unwrap();
        assert!(stored.all_vehicles.is_empty());
        assert_eq!(stored.last_updated, at(11));
    }
}

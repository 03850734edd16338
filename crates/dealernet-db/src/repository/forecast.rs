//! # Forecast Repository
//!
//! Demand forecasts keyed by the `{model}-{province}` slug. Each run
//! overwrites the keys it produced; keys it did not produce keep their
//! previous values.

use tracing::info;

use dealernet_core::DemandForecast;

use crate::document::{Collection, DocumentStore, WriteBatch};
use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct ForecastRepository {
    store: DocumentStore,
}

impl ForecastRepository {
    pub fn new(store: DocumentStore) -> Self {
        ForecastRepository { store }
    }

    pub async fn list(&self) -> DbResult<Vec<DemandForecast>> {
        self.store.get_all(Collection::DemandForecasts).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<DemandForecast>> {
        self.store.get(Collection::DemandForecasts, id).await
    }

    /// Writes every forecast in one batch. Returns how many were written;
    /// an empty slice writes nothing.
    pub async fn upsert_all(&self, forecasts: &[DemandForecast]) -> DbResult<usize> {
        if forecasts.is_empty() {
            return Ok(0);
        }

        let mut batch = WriteBatch::new();
        for forecast in forecasts {
            batch.upsert(Collection::DemandForecasts, &forecast.id, forecast)?;
        }
        self.store.commit(batch).await?;

        info!(count = forecasts.len(), "Demand forecasts written");
        Ok(forecasts.len())
    }
}

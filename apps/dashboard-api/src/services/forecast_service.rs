//! Weekly demand forecast job body.

use chrono::{DateTime, Utc};
use tracing::info;

use dealernet_core::forecast::compute_forecasts;
use dealernet_core::SourceCollections;
use dealernet_db::{Database, DbResult};

/// Recomputes demand forecasts from the trailing window of sales and writes
/// them in one batch. Returns how many documents were written.
///
/// Users and goals play no part in a forecast and are not read.
pub async fn run_forecast(db: &Database, now: DateTime<Utc>) -> DbResult<usize> {
    let (sale_repo, vehicle_repo, dealership_repo) = (db.sales(), db.vehicles(), db.dealerships());
    let (sales, vehicles, dealerships) =
        tokio::try_join!(sale_repo.list(), vehicle_repo.list(), dealership_repo.list())?;
    let sources = SourceCollections {
        sales,
        vehicles,
        dealerships,
        ..Default::default()
    };

    let forecasts = compute_forecasts(&sources, now);
    if forecasts.is_empty() {
        info!("No sales in the forecast window, skipping");
        return Ok(0);
    }

    let written = db.forecasts().upsert_all(&forecasts).await?;
    info!(forecasts = written, "Demand forecasts updated");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, state};
    use dealernet_core::sale::NewSale;
    use dealernet_core::CustomerDetails;

    fn sale(vin: &str) -> NewSale {
        NewSale {
            vehicle_id: vin.to_string(),
            customer: CustomerDetails {
                first_name: "Lee".to_string(),
                last_name: "Park".to_string(),
                ..Default::default()
            },
            sale_price_cents: 3_000_000,
            financing_income_cents: 0,
            insurance_income_cents: 0,
        }
    }

    #[tokio::test]
    async fn test_no_sales_writes_nothing() {
        let state = state().await;
        assert_eq!(run_forecast(&state.db, at(6, 9)).await.unwrap(), 0);
        assert!(state.db.forecasts().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forecast_per_model_and_province() {
        let state = state().await;
        for (vin, day) in [("VIN0001", 2), ("VIN0002", 3), ("VIN0003", 4)] {
            state.db.sales().record("sp-1", &sale(vin), at(6, day)).await.unwrap();
        }
        state.db.sales().record("admin-2", &sale("VIN0004"), at(6, 5)).await.unwrap();

        assert_eq!(run_forecast(&state.db, at(6, 9)).await.unwrap(), 2);

        let ranger = state.db.forecasts().get("ranger-ontario").await.unwrap().unwrap();
        assert_eq!(ranger.forecasted_sales, 1);
        assert_eq!(ranger.last_calculated, at(6, 9));

        let bronco = state.db.forecasts().get("bronco-alberta").await.unwrap().unwrap();
        assert_eq!(bronco.forecasted_sales, 1);

        // Outside the window nothing is rewritten
        assert_eq!(run_forecast(&state.db, at(11, 1)).await.unwrap(), 0);
        let kept = state.db.forecasts().get("ranger-ontario").await.unwrap().unwrap();
        assert_eq!(kept.last_calculated, at(6, 9));
    }
}

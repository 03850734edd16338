//! # Demand Forecast
//!
//! Trailing-average forecast of next-period unit sales per (model, province).
//!
//! ```text
//! sales in [now - 3 months, now] ──try_locate──► group by (model, province)
//!                                                         │
//!                                         ceil(total / 3) ▼
//!                                        DemandForecast { id: "ranger-ontario" }
//! ```
//!
//! An empty result means there is nothing to write; stale forecasts are
//! left alone until new sales show up.

use std::collections::BTreeMap;

use chrono::{DateTime, Months, Utc};

use crate::join::{EntityIndex, SourceCollections};
use crate::types::DemandForecast;
use crate::FORECAST_WINDOW_MONTHS;

/// Start of the trailing window ending at `now`.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(FORECAST_WINDOW_MONTHS))
        .unwrap_or_default()
}

/// Document id for a forecast: lowercase, spaces replaced by underscores.
///
/// ## Example
/// ```rust
/// use dealernet_core::forecast::forecast_id;
///
/// assert_eq!(forecast_id("Mustang Mach-E", "British Columbia"), "mustang_mach-e-british_columbia");
/// ```
pub fn forecast_id(model: &str, province: &str) -> String {
    format!("{}-{}", slug(model), slug(province))
}

fn slug(value: &str) -> String {
    value.to_lowercase().replace(' ', "_")
}

/// Computes one forecast per (model, province) seen in the window, sorted by
/// model then province.
///
/// The window has no upper bound, so a sale stamped after `now` still
/// counts. Sales whose vehicle or dealership cannot be found are skipped.
/// The salesperson is not needed and is never looked up.
pub fn compute_forecasts(collections: &SourceCollections, now: DateTime<Utc>) -> Vec<DemandForecast> {
    let start = window_start(now);
    let index = EntityIndex::from_collections(collections);

    let mut totals: BTreeMap<(&str, &str), u32> = BTreeMap::new();
    for located in collections
        .sales
        .iter()
        .filter(|s| s.timestamp >= start)
        .filter_map(|s| index.try_locate(s))
    {
        *totals
            .entry((located.vehicle.model.as_str(), located.dealership.province.as_str()))
            .or_insert(0) += 1;
    }

    totals
        .into_iter()
        .map(|((model, province), total)| DemandForecast {
            id: forecast_id(model, province),
            model: model.to_string(),
            province: province.to_string(),
            forecasted_sales: total.div_ceil(FORECAST_WINDOW_MONTHS),
            last_calculated: now,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Report Generator
//!
//! Builds the CSV exports offered on the dashboard.
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DETAILED: one row per vehicle in the selected dealerships             │
//! │    vehicle columns ─────────── always                                  │
//! │    sale date / price / seller ─ only when the sale is in the period    │
//! │    customer columns ─────────── whenever the vehicle has a sale        │
//! │                                                                         │
//! │  SUMMARY: one row per (dealership, model)                              │
//! │    current in-stock count + sales in the period                        │
//! │    pairs where both are zero are omitted                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## CSV Format
//! UTF-8 with a leading byte-order mark, `;` separator, every cell wrapped
//! in `"` with embedded quotes doubled, `\n` line endings, one header row.
//!
//! ## Dates
//! A missing start means the epoch, a missing end means `now`. The end is
//! inclusive of its whole day: it is moved to 23:59:59.999 UTC.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::join::{enrich_sales, EntityIndex, SourceCollections};
use crate::money::Money;
use crate::types::{Dealership, EnrichedSale, Vehicle, VehicleStatus};
use crate::FACTORY_LABEL;

/// Byte-order mark written before the header row.
pub const BOM: char = '\u{FEFF}';

/// Field separator.
pub const SEPARATOR: u8 = b';';

pub const DETAILED_HEADERS: [&str; 14] = [
    "VIN",
    "Model",
    "Color",
    "Year",
    "Status",
    "Dealership",
    "Sale Date",
    "Sale Price",
    "Salesperson",
    "Customer First Name",
    "Customer Last Name",
    "Customer Email",
    "Customer Phone",
    "Customer Address",
];

pub const SUMMARY_HEADERS: [&str; 4] = ["Dealership", "Model", "Current Stock", "Sales in Period"];

// =============================================================================
// Request
// =============================================================================

/// Report parameters as sent by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// Empty selects every dealership.
    #[serde(default)]
    pub dealership_ids: Vec<String>,
    /// `YYYY-MM-DD` or RFC 3339.
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub detailed: bool,
}

/// Inclusive time window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let start = match non_blank(start) {
            Some(raw) => parse_date("startDate", raw)?,
            None => epoch(),
        };
        let end = match non_blank(end) {
            Some(raw) => parse_date("endDate", raw)?,
            None => now,
        };
        Ok(ReportPeriod {
            start,
            end: end_of_day(end),
        })
    }

    pub fn contains(&self, at: &DateTime<Utc>) -> bool {
        *at >= self.start && *at <= self.end
    }
}

/// 1970-01-01T00:00:00Z.
fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(field: &str, raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
        })
}

fn end_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&at.date_naive().and_time(last_milli))
}

// =============================================================================
// CSV Writer
// =============================================================================

/// `;`-separated writer over an in-memory buffer. Every cell is quoted,
/// embedded quotes are doubled, rows end in `\n`.
pub struct CsvWriter {
    inner: csv::Writer<Vec<u8>>,
}

impl CsvWriter {
    pub fn new() -> Self {
        let inner = WriterBuilder::new()
            .delimiter(SEPARATOR)
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        CsvWriter { inner }
    }

    pub fn write_row<I, S>(&mut self, cells: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.inner.write_record(cells)?;
        Ok(())
    }

    /// The finished document, starting with the byte-order mark.
    pub fn finish(self) -> CoreResult<String> {
        let bytes = self
            .inner
            .into_inner()
            .map_err(|e| CoreError::Export(e.to_string()))?;
        let body = String::from_utf8(bytes).map_err(|e| CoreError::Export(e.to_string()))?;

        let mut document = String::with_capacity(BOM.len_utf8() + body.len());
        document.push(BOM);
        document.push_str(&body);
        Ok(document)
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Rows
// =============================================================================

/// Dealership selection. An empty selection matches everything.
struct Selection<'a>(HashSet<&'a str>);

impl<'a> Selection<'a> {
    fn new(ids: &'a [String]) -> Self {
        Selection(ids.iter().map(String::as_str).collect())
    }

    fn matches(&self, dealership_id: &str) -> bool {
        self.0.is_empty() || self.0.contains(dealership_id)
    }

    fn matches_vehicle(&self, vehicle: &Vehicle) -> bool {
        match vehicle.dealership_id.as_deref() {
            Some(id) => self.matches(id),
            None => self.0.is_empty(),
        }
    }
}

/// One row per selected vehicle. Vehicles themselves are not date-filtered.
pub fn detailed_rows(
    collections: &SourceCollections,
    enriched: &[EnrichedSale],
    dealership_ids: &[String],
    period: &ReportPeriod,
) -> Vec<Vec<String>> {
    let selection = Selection::new(dealership_ids);
    let index = EntityIndex::from_collections(collections);

    collections
        .vehicles
        .iter()
        .filter(|v| selection.matches_vehicle(v))
        .map(|vehicle| {
            let sale = enriched.iter().find(|s| s.vehicle.vin == vehicle.vin);
            let in_period = sale.filter(|s| {
                selection.matches(&s.dealership.id) && period.contains(&s.timestamp)
            });

            let dealership_name = match vehicle.dealership_id.as_deref() {
                None => FACTORY_LABEL.to_string(),
                Some(id) => index
                    .dealership(id)
                    .map(|d| d.name.clone())
                    .unwrap_or_default(),
            };

            // Customer columns follow the sale regardless of the period
            let customer = sale.map(|s| &s.customer);
            vec![
                vehicle.vin.clone(),
                vehicle.model.clone(),
                vehicle.color.clone(),
                vehicle.year.to_string(),
                vehicle.status.to_string(),
                dealership_name,
                in_period
                    .map(|s| s.timestamp.format("%-d/%-m/%Y").to_string())
                    .unwrap_or_default(),
                in_period
                    .map(|s| Money::from_cents(s.sale_price_cents).to_decimal_string())
                    .unwrap_or_default(),
                in_period
                    .map(|s| s.salesperson.name.clone())
                    .unwrap_or_default(),
                customer.map(|c| c.first_name.clone()).unwrap_or_default(),
                customer.map(|c| c.last_name.clone()).unwrap_or_default(),
                customer.map(|c| c.email.clone()).unwrap_or_default(),
                customer.map(|c| c.phone.clone()).unwrap_or_default(),
                customer.map(|c| c.address.clone()).unwrap_or_default(),
            ]
        })
        .collect()
}

/// Models to report for one dealership: those of its current vehicles,
/// then those of its in-period sales, in first-seen order.
fn models_for<'a>(
    dealership: &Dealership,
    vehicles: &'a [Vehicle],
    sales_in_period: &[&'a EnrichedSale],
) -> Vec<&'a str> {
    let mut models: Vec<&str> = Vec::new();
    let current = vehicles
        .iter()
        .filter(|v| v.dealership_id.as_deref() == Some(dealership.id.as_str()))
        .map(|v| v.model.as_str());
    let sold = sales_in_period
        .iter()
        .filter(|s| s.dealership.id == dealership.id)
        .map(|s| s.vehicle.model.as_str());

    for model in current.chain(sold) {
        if !models.contains(&model) {
            models.push(model);
        }
    }
    models
}

/// One row per (dealership, model) with stock or in-period sales.
pub fn summary_rows(
    collections: &SourceCollections,
    enriched: &[EnrichedSale],
    dealership_ids: &[String],
    period: &ReportPeriod,
) -> Vec<Vec<String>> {
    let selection = Selection::new(dealership_ids);
    let sales_in_period: Vec<&EnrichedSale> = enriched
        .iter()
        .filter(|s| selection.matches(&s.dealership.id) && period.contains(&s.timestamp))
        .collect();

    let mut rows = Vec::new();
    for dealership in collections
        .dealerships
        .iter()
        .filter(|d| selection.matches(&d.id))
    {
        for model in models_for(dealership, &collections.vehicles, &sales_in_period) {
            let stock = collections
                .vehicles
                .iter()
                .filter(|v| {
                    v.dealership_id.as_deref() == Some(dealership.id.as_str())
                        && v.model == model
                        && v.status == VehicleStatus::InStock
                })
                .count();
            let sold = sales_in_period
                .iter()
                .filter(|s| s.dealership.id == dealership.id && s.vehicle.model == model)
                .count();

            if stock > 0 || sold > 0 {
                rows.push(vec![
                    dealership.name.clone(),
                    model.to_string(),
                    stock.to_string(),
                    sold.to_string(),
                ]);
            }
        }
    }
    rows
}

/// Produces the complete CSV document for `request`.
pub fn generate_report(
    request: &ReportRequest,
    collections: &SourceCollections,
    now: DateTime<Utc>,
) -> CoreResult<String> {
    let period = ReportPeriod::resolve(
        request.start_date.as_deref(),
        request.end_date.as_deref(),
        now,
    )?;
    let enriched = enrich_sales(collections);

    let mut csv = CsvWriter::new();
    if request.detailed {
        csv.write_row(DETAILED_HEADERS)?;
        for row in detailed_rows(collections, &enriched, &request.dealership_ids, &period) {
            csv.write_row(&row)?;
        }
    } else {
        csv.write_row(SUMMARY_HEADERS)?;
        for row in summary_rows(collections, &enriched, &request.dealership_ids, &period) {
            csv.write_row(&row)?;
        }
    }
    csv.finish()
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Domain Types
//!
//! Core domain types used throughout DealerNet.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Vehicle      │   │      Sale       │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  vin (key)      │◄──│  vehicle_id     │   │  id             │       │
//! │  │  status         │   │  salesperson_id │──►│  role           │       │
//! │  │  dealership_id ─┼─┐ │  dealership_id ─┼─┐ │  commission bps │       │
//! │  │  history[]      │ │ │  profit (frozen)│ │ └─────────────────┘       │
//! │  └─────────────────┘ │ └─────────────────┘ │                           │
//! │                      ▼                     ▼                           │
//! │               ┌─────────────────┐   ┌─────────────────┐                │
//! │               │   Dealership    │   │      Goal       │                │
//! │               │  province, city │◄──│  entity_id      │                │
//! │               └─────────────────┘   │  month, type    │                │
//! │                                     └─────────────────┘                │
//! │                                                                         │
//! │  TransferRequest: pending ──► approved | rejected   (completed reserved)│
//! │  DemandForecast:  (model, province) ──► units for next period           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Every document type serializes with camelCase field names; the stored
//! JSON bodies and the HTTP payloads share one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Commission Rate
// =============================================================================

/// Commission rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10% (the default for a new salesperson)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionRate(u32);

impl CommissionRate {
    /// Creates a commission rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        CommissionRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Zero commission rate.
    #[inline]
    pub const fn zero() -> Self {
        CommissionRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for CommissionRate {
    fn default() -> Self {
        CommissionRate::zero()
    }
}

// =============================================================================
// Dealership
// =============================================================================

/// 2-D layout coordinates, used by the network map only.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

/// A dealership in the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Dealership {
    pub id: String,
    pub name: String,
    pub city: String,
    /// Regional rollups and forecasts group by this value.
    pub province: String,
    #[serde(default)]
    pub coords: Coords,
}

// =============================================================================
// Vehicle
// =============================================================================

/// Where a vehicle is in its lifecycle.
///
/// ```text
/// AtFactory ──assign──► InTransit ──accept──► InStock ──sell──► Sold
///                                                │
///                                  approve transfer
///                                                ▼
///                                          Transferring ──accept──► InStock
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum VehicleStatus {
    #[serde(rename = "At-Factory")]
    AtFactory,
    #[serde(rename = "In-Transit")]
    InTransit,
    #[serde(rename = "Arrived")]
    Arrived,
    #[serde(rename = "In-Stock")]
    InStock,
    #[serde(rename = "Sold")]
    Sold,
    #[serde(rename = "Transferring")]
    Transferring,
}

impl VehicleStatus {
    /// Wire/display name, identical to the serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::AtFactory => "At-Factory",
            VehicleStatus::InTransit => "In-Transit",
            VehicleStatus::Arrived => "Arrived",
            VehicleStatus::InStock => "In-Stock",
            VehicleStatus::Sold => "Sold",
            VehicleStatus::Transferring => "Transferring",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a vehicle's append-only status log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VehicleHistoryEntry {
    pub status: VehicleStatus,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

/// A vehicle, keyed by its VIN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub vin: String,
    pub model: String,
    pub color: String,
    pub year: i32,
    /// Factory cost in cents.
    pub cost_price_cents: i64,
    pub status: VehicleStatus,
    /// `None` while the vehicle is at the factory.
    pub dealership_id: Option<String>,
    /// Ordered by date; the last entry mirrors `status`.
    pub history: Vec<VehicleHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>", optional)]
    pub estimated_arrival_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub current_location: Option<String>,
}

impl Vehicle {
    /// Factory cost as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Moves the vehicle to `status` and appends the matching history entry.
    ///
    /// The entry date never goes backwards: an `at` earlier than the last
    /// entry is clamped to that entry's date.
    pub fn record_status(&mut self, status: VehicleStatus, at: DateTime<Utc>) {
        let date = match self.history.last() {
            Some(last) if last.date > at => last.date,
            _ => at,
        };
        self.status = status;
        self.history.push(VehicleHistoryEntry { status, date });
    }
}

// =============================================================================
// User
// =============================================================================

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Role {
    /// Network operator. Manages factory inventory, sees everything.
    Factory,
    DealershipAdmin,
    Salesperson,
}

impl Role {
    /// Roles that must be attached to a dealership.
    pub const fn requires_dealership(&self) -> bool {
        matches!(self, Role::DealershipAdmin | Role::Salesperson)
    }
}

/// A dashboard user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub dealership_id: Option<String>,
    /// Only meaningful for salespeople.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub commission_rate_bps: Option<u32>,
}

impl User {
    /// Commission rate, zero when the user has none.
    pub fn commission_rate(&self) -> CommissionRate {
        CommissionRate::from_bps(self.commission_rate_bps.unwrap_or(0))
    }

    /// Whether this user administers `dealership_id`.
    pub fn is_admin_of(&self, dealership_id: &str) -> bool {
        self.role == Role::DealershipAdmin && self.dealership_id.as_deref() == Some(dealership_id)
    }

    /// Whether this user works at `dealership_id`, in any dealership role.
    pub fn works_at(&self, dealership_id: &str) -> bool {
        self.role.requires_dealership() && self.dealership_id.as_deref() == Some(dealership_id)
    }
}

// =============================================================================
// Goal
// =============================================================================

/// What a goal measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum GoalType {
    Profit,
    SalesCount,
}

impl GoalType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GoalType::Profit => "profit",
            GoalType::SalesCount => "salesCount",
        }
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monthly target for a salesperson or a dealership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    /// `{month}-{entityId}-{type}`, see [`Goal::document_id`].
    pub id: String,
    /// User id or dealership id.
    pub entity_id: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    /// Profit goals are in cents, sales-count goals in units.
    pub target: i64,
    /// `YYYY-MM`.
    pub month: String,
}

impl Goal {
    /// Document id for a goal. The type is part of the key so a profit goal
    /// and a sales-count goal for the same entity and month never collide.
    pub fn document_id(month: &str, entity_id: &str, goal_type: GoalType) -> String {
        format!("{}-{}-{}", month, entity_id, goal_type)
    }
}

// =============================================================================
// Transfer Request
// =============================================================================

/// Transfer request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    /// Reserved for the receiving-side confirmation; never assigned here.
    Completed,
}

impl TransferStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to move a vehicle between two dealerships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub id: String,
    /// VIN of the vehicle to move.
    pub vehicle_id: String,
    pub from_dealership_id: String,
    pub to_dealership_id: String,
    pub requesting_user_id: String,
    pub status: TransferStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub approved_by_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub rejection_reason: Option<String>,
}

// =============================================================================
// Demand Forecast
// =============================================================================

/// Forecasted unit demand for one (model, province) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DemandForecast {
    pub id: String,
    pub model: String,
    pub province: String,
    pub forecasted_sales: u32,
    #[ts(as = "String")]
    pub last_calculated: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// Buyer contact details captured on a sale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// A recorded vehicle sale.
///
/// `profit_cents` and `commission_cents` are frozen when the sale is
/// recorded; later cost or rate changes never touch them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// VIN.
    pub vehicle_id: String,
    pub salesperson_id: String,
    pub dealership_id: String,
    pub customer: CustomerDetails,
    pub sale_price_cents: i64,
    pub financing_income_cents: i64,
    pub insurance_income_cents: i64,
    pub profit_cents: i64,
    pub commission_cents: i64,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl Sale {
    /// Sale price plus financing and insurance income.
    pub fn gross_revenue(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
            + Money::from_cents(self.financing_income_cents)
            + Money::from_cents(self.insurance_income_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    #[inline]
    pub fn commission(&self) -> Money {
        Money::from_cents(self.commission_cents)
    }

    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }
}

/// A sale with its vehicle, salesperson and dealership resolved.
///
/// Only ever built by the join layer and never persisted on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedSale {
    pub id: String,
    pub vehicle: Vehicle,
    pub salesperson: User,
    pub dealership: Dealership,
    pub customer: CustomerDetails,
    pub sale_price_cents: i64,
    pub financing_income_cents: i64,
    pub insurance_income_cents: i64,
    pub profit_cents: i64,
    pub commission_cents: i64,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl EnrichedSale {
    /// Builds the projection from a sale and its three resolved references.
    pub fn new(sale: &Sale, vehicle: &Vehicle, salesperson: &User, dealership: &Dealership) -> Self {
        EnrichedSale {
            id: sale.id.clone(),
            vehicle: vehicle.clone(),
            salesperson: salesperson.clone(),
            dealership: dealership.clone(),
            customer: sale.customer.clone(),
            sale_price_cents: sale.sale_price_cents,
            financing_income_cents: sale.financing_income_cents,
            insurance_income_cents: sale.insurance_income_cents,
            profit_cents: sale.profit_cents,
            commission_cents: sale.commission_cents,
            timestamp: sale.timestamp,
        }
    }

    pub fn gross_revenue(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
            + Money::from_cents(self.financing_income_cents)
            + Money::from_cents(self.insurance_income_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    #[inline]
    pub fn commission(&self) -> Money {
        Money::from_cents(self.commission_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn factory_vehicle(at: DateTime<Utc>) -> Vehicle {
        Vehicle {
            vin: "VIN0001".to_string(),
            model: "Ranger".to_string(),
            color: "Blue".to_string(),
            year: 2024,
            cost_price_cents: 2_500_000,
            status: VehicleStatus::AtFactory,
            dealership_id: None,
            history: vec![VehicleHistoryEntry {
                status: VehicleStatus::AtFactory,
                date: at,
            }],
            estimated_arrival_date: None,
            current_location: None,
        }
    }

    #[test]
    fn test_vehicle_status_wire_names() {
        let json = serde_json::to_string(&VehicleStatus::InStock).unwrap();
        assert_eq!(json, "\"In-Stock\"");
        let parsed: VehicleStatus = serde_json::from_str("\"At-Factory\"").unwrap();
        assert_eq!(parsed, VehicleStatus::AtFactory);
        assert_eq!(VehicleStatus::Transferring.to_string(), "Transferring");
    }

    #[test]
    fn test_record_status_keeps_history_monotone() {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let mut vehicle = factory_vehicle(t0);

        // Earlier clock reading is clamped to the last entry
        let earlier = t0 - chrono::Duration::hours(1);
        vehicle.record_status(VehicleStatus::InTransit, earlier);

        assert_eq!(vehicle.status, VehicleStatus::InTransit);
        assert_eq!(vehicle.history.len(), 2);
        assert_eq!(vehicle.history[1].date, t0);
        assert_eq!(vehicle.history.last().map(|h| h.status), Some(vehicle.status));
    }

    #[test]
    fn test_goal_document_id_includes_type() {
        let profit = Goal::document_id("2024-06", "user-1", GoalType::Profit);
        let count = Goal::document_id("2024-06", "user-1", GoalType::SalesCount);
        assert_eq!(profit, "2024-06-user-1-profit");
        assert_eq!(count, "2024-06-user-1-salesCount");
        assert_ne!(profit, count);
    }

    #[test]
    fn test_goal_serializes_type_field() {
        let goal = Goal {
            id: "2024-06-d1-profit".to_string(),
            entity_id: "d1".to_string(),
            goal_type: GoalType::Profit,
            target: 1_000_000,
            month: "2024-06".to_string(),
        };
        let json = serde_json::to_value(&goal).unwrap();
        assert_eq!(json["type"], "profit");
        assert_eq!(json["entityId"], "d1");
    }

    #[test]
    fn test_user_roles() {
        let admin = User {
            id: "u1".to_string(),
            username: "admin".to_string(),
            name: "Ana Admin".to_string(),
            role: Role::DealershipAdmin,
            dealership_id: Some("d1".to_string()),
            commission_rate_bps: None,
        };
        assert!(admin.is_admin_of("d1"));
        assert!(!admin.is_admin_of("d2"));
        assert!(admin.works_at("d1"));
        assert!(admin.commission_rate().is_zero());
        assert!(!Role::Factory.requires_dealership());
    }

    #[test]
    fn test_sale_gross_revenue() {
        let sale = Sale {
            id: "s1".to_string(),
            vehicle_id: "VIN0001".to_string(),
            salesperson_id: "u1".to_string(),
            dealership_id: "d1".to_string(),
            customer: CustomerDetails::default(),
            sale_price_cents: 3_000_000,
            financing_income_cents: 100_000,
            insurance_income_cents: 50_000,
            profit_cents: 650_000,
            commission_cents: 65_000,
            timestamp: Utc::now(),
        };
        assert_eq!(sale.gross_revenue(), Money::from_major_minor(31500, 0));
    }

    #[test]
    fn test_omitted_fields_are_optional_in_bindings() {
        let vehicle = Vehicle::decl();
        assert!(vehicle.contains("estimatedArrivalDate?: string"));
        assert!(vehicle.contains("currentLocation?: string"));

        assert!(User::decl().contains("commissionRateBps?: number"));

        let transfer = TransferRequest::decl();
        assert!(transfer.contains("approvedByUserId?: string"));
        assert!(transfer.contains("rejectionReason?: string"));
    }
}

//! # Aggregation Engine
//!
//! Computes everything the dashboard shows from the five raw collections.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    MetricsSnapshot::compute                             │
//! │                                                                         │
//! │  SourceCollections ──► enrich_sales ──┬──► FinancialKpis (all time)    │
//! │                                       │                                 │
//! │                                       ├──► regional rollup (province)  │
//! │                                       │                                 │
//! │                         current month ├──► salespeople ─► rank ─► top 10│
//! │                         (YYYY-MM of   │                                 │
//! │                          `now`)       └──► dealerships ─► rank ─► top 5 │
//! │                                                                         │
//! │  Goals for the current month are attached per entity and per type.     │
//! │  A missing goal stays absent; it is never reported as a zero target.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//! The engine is a pure function of its input plus `now`. Running it twice
//! over the same collections produces identical output apart from
//! `last_updated`, so a full rebuild on every write is always safe.
//!
//! ## Example
//! ```rust
//! use chrono::Utc;
//! use dealernet_core::{MetricsSnapshot, SourceCollections};
//!
//! let snapshot = MetricsSnapshot::compute(SourceCollections::default(), Utc::now());
//! assert_eq!(snapshot.financial_kpis.average_margin, 0.0);
//! assert!(snapshot.top_salespeople.is_empty());
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::join::{enrich_sales, EntityIndex, SourceCollections};
use crate::money::Money;
use crate::types::{Dealership, EnrichedSale, Goal, GoalType, Role, User, Vehicle};
use crate::{TOP_DEALERSHIPS_LIMIT, TOP_SALESPEOPLE_LIMIT};

// =============================================================================
// Financial KPIs
// =============================================================================

/// Network-wide financial totals over every enriched sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FinancialKpis {
    /// Σ (sale price + financing income + insurance income).
    pub total_revenue_cents: i64,
    pub total_profit_cents: i64,
    pub total_commissions_cents: i64,
    /// Profit over revenue, in percent. Exactly 0 when revenue is 0.
    pub average_margin: f64,
}

impl FinancialKpis {
    pub fn from_sales(sales: &[EnrichedSale]) -> Self {
        let revenue: Money = sales.iter().map(EnrichedSale::gross_revenue).sum();
        let profit: Money = sales.iter().map(EnrichedSale::profit).sum();
        let commissions: Money = sales.iter().map(EnrichedSale::commission).sum();

        let average_margin = if revenue.is_zero() {
            0.0
        } else {
            profit.cents() as f64 / revenue.cents() as f64 * 100.0
        };

        FinancialKpis {
            total_revenue_cents: revenue.cents(),
            total_profit_cents: profit.cents(),
            total_commissions_cents: commissions.cents(),
            average_margin,
        }
    }
}

// =============================================================================
// Regional Rollup
// =============================================================================

/// Sales count for one province.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegionalSale {
    /// Province name.
    pub name: String,
    pub sales: u32,
}

/// One row per distinct province among `dealerships`, in order of first
/// appearance. Provinces without sales are kept with a zero count.
pub fn regional_sales(sales: &[EnrichedSale], dealerships: &[Dealership]) -> Vec<RegionalSale> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for sale in sales {
        *counts.entry(sale.dealership.province.as_str()).or_insert(0) += 1;
    }

    let mut rows: Vec<RegionalSale> = Vec::new();
    for dealership in dealerships {
        if rows.iter().any(|r| r.name == dealership.province) {
            continue;
        }
        rows.push(RegionalSale {
            name: dealership.province.clone(),
            sales: counts.get(dealership.province.as_str()).copied().unwrap_or(0),
        });
    }
    rows
}

// =============================================================================
// Performance
// =============================================================================

/// `YYYY-MM` bucket of a timestamp.
pub fn month_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Current-month figures for one performer plus its goals, if any.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub profit_cents: i64,
    pub sales_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub profit_goal: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub sales_count_goal: Option<i64>,
}

/// Progress towards one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal_type: GoalType,
    pub achieved: i64,
    pub target: i64,
    pub percentage: f64,
    pub is_met: bool,
}

impl PerformanceStats {
    /// Progress towards the goal of `goal_type`; `None` when no goal is set.
    pub fn progress(&self, goal_type: GoalType) -> Option<GoalProgress> {
        let (achieved, target) = match goal_type {
            GoalType::Profit => (self.profit_cents, self.profit_goal?),
            GoalType::SalesCount => (self.sales_count as i64, self.sales_count_goal?),
        };
        let percentage = if target <= 0 {
            0.0
        } else {
            achieved as f64 / target as f64 * 100.0
        };
        Some(GoalProgress {
            goal_type,
            achieved,
            target,
            percentage,
            is_met: percentage >= 100.0,
        })
    }
}

/// A salesperson on the leaderboard, labelled with their dealership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalespersonPerformance {
    pub id: String,
    pub name: String,
    /// Empty when the dealership cannot be found.
    pub dealership_name: String,
    #[serde(flatten)]
    pub stats: PerformanceStats,
}

/// A dealership on the leaderboard, labelled with its city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DealershipPerformance {
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(flatten)]
    pub stats: PerformanceStats,
}

/// A leaderboard entry. Each variant carries its own label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Performer {
    Salesperson(SalespersonPerformance),
    Dealership(DealershipPerformance),
}

impl Performer {
    pub fn id(&self) -> &str {
        match self {
            Performer::Salesperson(p) => &p.id,
            Performer::Dealership(p) => &p.id,
        }
    }

    /// Dealership name for salespeople, city for dealerships.
    pub fn label(&self) -> &str {
        match self {
            Performer::Salesperson(p) => &p.dealership_name,
            Performer::Dealership(p) => &p.location,
        }
    }

    pub fn stats(&self) -> &PerformanceStats {
        match self {
            Performer::Salesperson(p) => &p.stats,
            Performer::Dealership(p) => &p.stats,
        }
    }
}

/// Current-month totals and goals for one entity.
fn monthly_stats<'a, F>(
    sales: &'a [EnrichedSale],
    goals: &[Goal],
    month: &str,
    entity_id: &str,
    owner_of: F,
) -> PerformanceStats
where
    F: Fn(&'a EnrichedSale) -> &'a str,
{
    let mut stats = PerformanceStats::default();
    for sale in sales {
        if owner_of(sale) == entity_id && month_key(&sale.timestamp) == month {
            stats.profit_cents += sale.profit_cents;
            stats.sales_count += 1;
        }
    }

    let goal_target = |goal_type: GoalType| {
        goals
            .iter()
            .find(|g| g.entity_id == entity_id && g.month == month && g.goal_type == goal_type)
            .map(|g| g.target)
    };
    stats.profit_goal = goal_target(GoalType::Profit);
    stats.sales_count_goal = goal_target(GoalType::SalesCount);
    stats
}

/// Every salesperson with their current-month stats. Salespeople without
/// sales this month are included at zero.
pub fn salesperson_performance(
    sales: &[EnrichedSale],
    users: &[User],
    index: &EntityIndex<'_>,
    goals: &[Goal],
    month: &str,
) -> Vec<Performer> {
    users
        .iter()
        .filter(|u| u.role == Role::Salesperson)
        .map(|user| {
            let dealership_name = user
                .dealership_id
                .as_deref()
                .and_then(|id| index.dealership(id))
                .map(|d| d.name.clone())
                .unwrap_or_default();
            Performer::Salesperson(SalespersonPerformance {
                id: user.id.clone(),
                name: user.name.clone(),
                dealership_name,
                stats: monthly_stats(sales, goals, month, &user.id, |s| {
                    s.salesperson.id.as_str()
                }),
            })
        })
        .collect()
}

/// Every dealership with its current-month stats.
pub fn dealership_performance(
    sales: &[EnrichedSale],
    dealerships: &[Dealership],
    goals: &[Goal],
    month: &str,
) -> Vec<Performer> {
    dealerships
        .iter()
        .map(|dealership| {
            Performer::Dealership(DealershipPerformance {
                id: dealership.id.clone(),
                name: dealership.name.clone(),
                location: dealership.city.clone(),
                stats: monthly_stats(sales, goals, month, &dealership.id, |s| {
                    s.dealership.id.as_str()
                }),
            })
        })
        .collect()
}

/// Sorts by profit, highest first, and keeps the first `limit`.
/// Ties keep their input order.
pub fn rank(mut performers: Vec<Performer>, limit: usize) -> Vec<Performer> {
    performers.sort_by(|a, b| b.stats().profit_cents.cmp(&a.stats().profit_cents));
    performers.truncate(limit);
    performers
}

// =============================================================================
// Metrics Snapshot
// =============================================================================

/// The materialized dashboard document (`metrics/dashboard`).
///
/// Always replaced as a whole; never patched field by field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub enriched_sales: Vec<EnrichedSale>,
    pub all_regional_sales: Vec<RegionalSale>,
    pub financial_kpis: FinancialKpis,
    pub top_salespeople: Vec<Performer>,
    pub top_dealerships: Vec<Performer>,
    pub all_vehicles: Vec<Vehicle>,
    pub all_dealerships: Vec<Dealership>,
    pub all_users: Vec<User>,
    pub all_goals: Vec<Goal>,
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
}

impl MetricsSnapshot {
    /// Runs the whole pipeline over `collections` as of `now`.
    pub fn compute(collections: SourceCollections, now: DateTime<Utc>) -> Self {
        let month = month_key(&now);
        let enriched_sales = enrich_sales(&collections);

        let (all_regional_sales, financial_kpis, top_salespeople, top_dealerships) = {
            let index = EntityIndex::from_collections(&collections);
            (
                regional_sales(&enriched_sales, &collections.dealerships),
                FinancialKpis::from_sales(&enriched_sales),
                rank(
                    salesperson_performance(
                        &enriched_sales,
                        &collections.users,
                        &index,
                        &collections.goals,
                        &month,
                    ),
                    TOP_SALESPEOPLE_LIMIT,
                ),
                rank(
                    dealership_performance(
                        &enriched_sales,
                        &collections.dealerships,
                        &collections.goals,
                        &month,
                    ),
                    TOP_DEALERSHIPS_LIMIT,
                ),
            )
        };

        let SourceCollections {
            vehicles,
            users,
            dealerships,
            goals,
            ..
        } = collections;

        MetricsSnapshot {
            enriched_sales,
            all_regional_sales,
            financial_kpis,
            top_salespeople,
            top_dealerships,
            all_vehicles: vehicles,
            all_dealerships: dealerships,
            all_users: users,
            all_goals: goals,
            last_updated: now,
        }
    }

    /// True when both snapshots hold the same data, ignoring `last_updated`.
    pub fn same_content(&self, other: &MetricsSnapshot) -> bool {
        MetricsSnapshot {
            last_updated: other.last_updated,
            ..self.clone()
        } == *other
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn goal(entity_id: &str, goal_type: GoalType, target: i64, month: &str) -> Goal {
        Goal {
            id: Goal::document_id(month, entity_id, goal_type),
            entity_id: entity_id.to_string(),
            goal_type,
            target,
            month: month.to_string(),
        }
    }

    #[test]
    fn test_scenario_kpis() {
        let snapshot = MetricsSnapshot::compute(fixtures::scenario_collections(), fixtures::now());
        let kpis = &snapshot.financial_kpis;

        assert_eq!(kpis.total_revenue_cents, 9_450_000);
        assert_eq!(kpis.total_profit_cents, 1_950_000);
        assert_eq!(kpis.total_commissions_cents, 195_000);
        assert!((kpis.average_margin - 20.634_920_6).abs() < 1e-6);
    }

    #[test]
    fn test_zero_revenue_margin_is_zero() {
        let kpis = FinancialKpis::from_sales(&[]);
        assert_eq!(kpis.average_margin, 0.0);
        assert!(!kpis.average_margin.is_nan());
    }

    #[test]
    fn test_regional_rollup_keeps_empty_provinces() {
        let snapshot = MetricsSnapshot::compute(fixtures::scenario_collections(), fixtures::now());
        let names: Vec<_> = snapshot
            .all_regional_sales
            .iter()
            .map(|r| (r.name.as_str(), r.sales))
            .collect();
        assert_eq!(names, vec![("Ontario", 3), ("Alberta", 0), ("Nova Scotia", 0)]);
    }

    #[test]
    fn test_regional_rollup_dedupes_provinces() {
        let mut data = fixtures::scenario_collections();
        data.dealerships
            .push(fixtures::dealership("d-4", "Lakeside", "Ottawa", "Ontario"));
        let rows = regional_sales(&enrich_sales(&data), &data.dealerships);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_dropped_sale_never_reaches_aggregates() {
        let mut data = fixtures::scenario_collections();
        data.sales[0].vehicle_id = "GHOST".to_string();
        let snapshot = MetricsSnapshot::compute(data, fixtures::now());

        assert_eq!(snapshot.enriched_sales.len(), 2);
        assert_eq!(snapshot.financial_kpis.total_profit_cents, 1_300_000);
        assert_eq!(snapshot.all_regional_sales[0].sales, 2);
        assert_eq!(snapshot.top_salespeople[0].stats().sales_count, 2);
    }

    #[test]
    fn test_performers_include_zero_activity() {
        let snapshot = MetricsSnapshot::compute(fixtures::scenario_collections(), fixtures::now());

        // Only salespeople are ranked, admins and factory users are not
        assert_eq!(snapshot.top_salespeople.len(), 2);
        assert_eq!(snapshot.top_salespeople[0].id(), "sp-1");
        assert_eq!(snapshot.top_salespeople[0].label(), "Maple Motors");
        assert_eq!(snapshot.top_salespeople[1].id(), "sp-2");
        assert_eq!(snapshot.top_salespeople[1].stats().profit_cents, 0);
        assert_eq!(snapshot.top_salespeople[1].stats().sales_count, 0);

        assert_eq!(snapshot.top_dealerships.len(), 3);
        assert_eq!(snapshot.top_dealerships[0].label(), "Toronto");
    }

    #[test]
    fn test_only_current_month_counts_for_performance() {
        let mut data = fixtures::scenario_collections();
        data.sales[0].timestamp = fixtures::at(2024, 5, 31);
        let snapshot = MetricsSnapshot::compute(data, fixtures::now());

        assert_eq!(snapshot.top_salespeople[0].stats().sales_count, 2);
        // KPIs stay all-time
        assert_eq!(snapshot.financial_kpis.total_profit_cents, 1_950_000);
    }

    #[test]
    fn test_goal_progress_met_at_120_percent() {
        let mut data = fixtures::scenario_collections();
        data.sales.truncate(1);
        data.sales[0].profit_cents = 1_200_000;
        data.goals = vec![goal("sp-1", GoalType::Profit, 1_000_000, "2024-06")];

        let snapshot = MetricsSnapshot::compute(data, fixtures::now());
        let top = &snapshot.top_salespeople[0];
        let progress = top.stats().progress(GoalType::Profit).expect("goal set");

        assert!((progress.percentage - 120.0).abs() < 1e-9);
        assert!(progress.is_met);
    }

    #[test]
    fn test_missing_goal_is_absent_not_zero() {
        let mut data = fixtures::scenario_collections();
        data.goals = vec![
            goal("sp-1", GoalType::SalesCount, 5, "2024-06"),
            goal("sp-1", GoalType::Profit, 9_999, "2024-05"),
        ];
        let snapshot = MetricsSnapshot::compute(data, fixtures::now());
        let stats = snapshot.top_salespeople[0].stats();

        assert_eq!(stats.sales_count_goal, Some(5));
        assert_eq!(stats.profit_goal, None);
        assert!(stats.progress(GoalType::Profit).is_none());

        let json = serde_json::to_value(&snapshot.top_salespeople[0]).unwrap();
        assert_eq!(json["kind"], "salesperson");
        assert_eq!(json["salesCountGoal"], 5);
        assert!(json.get("profitGoal").is_none());
    }

    #[test]
    fn test_ranking_sorts_and_truncates() {
        let mut data = fixtures::scenario_collections();
        data.users = (0..12)
            .map(|i| {
                fixtures::user(
                    &format!("sp-{}", i),
                    &format!("Seller {}", i),
                    Role::Salesperson,
                    Some("d-1"),
                )
            })
            .collect();
        // sp-5 makes the most
        data.sales[0].salesperson_id = "sp-5".to_string();
        data.sales[1].salesperson_id = "sp-5".to_string();
        data.sales[2].salesperson_id = "sp-7".to_string();

        let snapshot = MetricsSnapshot::compute(data, fixtures::now());
        assert_eq!(snapshot.top_salespeople.len(), TOP_SALESPEOPLE_LIMIT);
        assert_eq!(snapshot.top_salespeople[0].id(), "sp-5");
        assert_eq!(snapshot.top_salespeople[1].id(), "sp-7");
        // Zero-profit ties keep collection order
        assert_eq!(snapshot.top_salespeople[2].id(), "sp-0");
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let first = MetricsSnapshot::compute(fixtures::scenario_collections(), fixtures::now());
        let later = fixtures::now() + chrono::Duration::minutes(5);
        let second = MetricsSnapshot::compute(fixtures::scenario_collections(), later);

        assert_ne!(first.last_updated, second.last_updated);
        assert!(first.same_content(&second));
        assert_eq!(
            serde_json::to_string(&first.financial_kpis).unwrap(),
            serde_json::to_string(&second.financial_kpis).unwrap()
        );
        assert_eq!(first.all_regional_sales, second.all_regional_sales);
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key(&fixtures::at(2024, 6, 1)), "2024-06");
    }

    #[test]
    fn test_goal_targets_are_optional_in_bindings() {
        let decl = PerformanceStats::decl();
        assert!(decl.contains("profitGoal?:"));
        assert!(decl.contains("salesCountGoal?:"));
    }
}

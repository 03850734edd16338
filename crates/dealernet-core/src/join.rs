//! # Entity Join Layer
//!
//! Resolves the foreign keys of each [`Sale`] into full objects.
//!
//! ```text
//! Sale ──vehicle_id──────► Vehicle     ┐
//!      ──salesperson_id──► User        ├── all three found ──► Some(EnrichedSale)
//!      ──dealership_id───► Dealership  ┘   any one missing ──► None (dropped)
//! ```
//!
//! A sale whose references do not all resolve is left out of every enriched
//! view. This is a filter, not an error: it is how the dashboard behaves when
//! a referenced record has been removed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Dealership, EnrichedSale, Goal, Sale, User, Vehicle};

/// The five raw collections every aggregation starts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCollections {
    pub sales: Vec<Sale>,
    pub vehicles: Vec<Vehicle>,
    pub users: Vec<User>,
    pub dealerships: Vec<Dealership>,
    pub goals: Vec<Goal>,
}

/// Borrowed lookup tables over vehicles, users and dealerships.
///
/// When two records share a key the first one wins.
#[derive(Debug, Default)]
pub struct EntityIndex<'a> {
    vehicles: HashMap<&'a str, &'a Vehicle>,
    users: HashMap<&'a str, &'a User>,
    dealerships: HashMap<&'a str, &'a Dealership>,
}

/// A sale resolved to its vehicle and dealership only.
#[derive(Debug, Clone, Copy)]
pub struct LocatedSale<'a> {
    pub sale: &'a Sale,
    pub vehicle: &'a Vehicle,
    pub dealership: &'a Dealership,
}

impl<'a> EntityIndex<'a> {
    pub fn new(vehicles: &'a [Vehicle], users: &'a [User], dealerships: &'a [Dealership]) -> Self {
        let mut index = EntityIndex::default();
        for vehicle in vehicles {
            index.vehicles.entry(vehicle.vin.as_str()).or_insert(vehicle);
        }
        for user in users {
            index.users.entry(user.id.as_str()).or_insert(user);
        }
        for dealership in dealerships {
            index
                .dealerships
                .entry(dealership.id.as_str())
                .or_insert(dealership);
        }
        index
    }

    pub fn from_collections(collections: &'a SourceCollections) -> Self {
        Self::new(
            &collections.vehicles,
            &collections.users,
            &collections.dealerships,
        )
    }

    pub fn vehicle(&self, vin: &str) -> Option<&'a Vehicle> {
        self.vehicles.get(vin).copied()
    }

    pub fn user(&self, id: &str) -> Option<&'a User> {
        self.users.get(id).copied()
    }

    pub fn dealership(&self, id: &str) -> Option<&'a Dealership> {
        self.dealerships.get(id).copied()
    }

    /// Joins one sale. `None` when any of the three references is missing.
    pub fn try_join(&self, sale: &Sale) -> Option<EnrichedSale> {
        let vehicle = self.vehicle(&sale.vehicle_id)?;
        let salesperson = self.user(&sale.salesperson_id)?;
        let dealership = self.dealership(&sale.dealership_id)?;
        Some(EnrichedSale::new(sale, vehicle, salesperson, dealership))
    }

    /// Joins vehicle and dealership only; the salesperson is not looked up.
    pub fn try_locate(&self, sale: &'a Sale) -> Option<LocatedSale<'a>> {
        let vehicle = self.vehicle(&sale.vehicle_id)?;
        let dealership = self.dealership(&sale.dealership_id)?;
        Some(LocatedSale {
            sale,
            vehicle,
            dealership,
        })
    }
}

/// Enriches every sale that fully resolves, preserving input order.
pub fn enrich_sales(collections: &SourceCollections) -> Vec<EnrichedSale> {
    let index = EntityIndex::from_collections(collections);
    collections
        .sales
        .iter()
        .filter_map(|sale| index.try_join(sale))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_try_join_resolves_all_references() {
        let data = fixtures::scenario_collections();
        let index = EntityIndex::from_collections(&data);

        let enriched = index.try_join(&data.sales[0]).expect("joins");
        assert_eq!(enriched.vehicle.vin, data.sales[0].vehicle_id);
        assert_eq!(enriched.salesperson.id, "sp-1");
        assert_eq!(enriched.dealership.id, "d-1");
        assert_eq!(enriched.profit_cents, 650_000);
    }

    #[test]
    fn test_missing_vehicle_drops_sale() {
        let mut data = fixtures::scenario_collections();
        data.sales[1].vehicle_id = "GHOST".to_string();

        let enriched = enrich_sales(&data);
        assert_eq!(enriched.len(), 2);
        assert!(enriched.iter().all(|s| s.id != data.sales[1].id));
    }

    #[test]
    fn test_missing_salesperson_or_dealership_drops_sale() {
        let mut data = fixtures::scenario_collections();
        data.sales[0].salesperson_id = "nobody".to_string();
        data.sales[2].dealership_id = "closed".to_string();

        let enriched = enrich_sales(&data);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].id, data.sales[1].id);
    }

    #[test]
    fn test_try_locate_skips_salesperson() {
        let mut data = fixtures::scenario_collections();
        data.sales[0].salesperson_id = "nobody".to_string();
        let index = EntityIndex::from_collections(&data);

        assert!(index.try_join(&data.sales[0]).is_none());
        let located = index.try_locate(&data.sales[0]).expect("locates");
        assert_eq!(located.dealership.province, "Ontario");
    }

    #[test]
    fn test_duplicate_keys_first_wins() {
        let mut data = fixtures::scenario_collections();
        let mut dup = data.dealerships[0].clone();
        dup.name = "Impostor".to_string();
        data.dealerships.push(dup);

        let index = EntityIndex::from_collections(&data);
        assert_eq!(index.dealership("d-1").map(|d| d.name.as_str()), Some("Maple Motors"));
    }
}

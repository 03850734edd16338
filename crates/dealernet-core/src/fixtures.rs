//! Shared builders for unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::join::SourceCollections;
use crate::types::*;

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

/// Fixed "now" used across tests: 2024-06-15 12:00 UTC.
pub fn now() -> DateTime<Utc> {
    at(2024, 6, 15)
}

pub fn dealership(id: &str, name: &str, city: &str, province: &str) -> Dealership {
    Dealership {
        id: id.to_string(),
        name: name.to_string(),
        city: city.to_string(),
        province: province.to_string(),
        coords: Coords::default(),
    }
}

pub fn vehicle(
    vin: &str,
    model: &str,
    status: VehicleStatus,
    dealership_id: Option<&str>,
    cost_price_cents: i64,
) -> Vehicle {
    let created = at(2024, 1, 2);
    let mut history = vec![VehicleHistoryEntry {
        status: VehicleStatus::AtFactory,
        date: created,
    }];
    if status != VehicleStatus::AtFactory {
        history.push(VehicleHistoryEntry {
            status,
            date: at(2024, 2, 1),
        });
    }
    Vehicle {
        vin: vin.to_string(),
        model: model.to_string(),
        color: "White".to_string(),
        year: 2024,
        cost_price_cents,
        status,
        dealership_id: dealership_id.map(str::to_string),
        history,
        estimated_arrival_date: None,
        current_location: None,
    }
}

pub fn user(id: &str, name: &str, role: Role, dealership_id: Option<&str>) -> User {
    User {
        id: id.to_string(),
        username: id.to_string(),
        name: name.to_string(),
        role,
        dealership_id: dealership_id.map(str::to_string),
        commission_rate_bps: match role {
            Role::Salesperson => Some(1000),
            _ => None,
        },
    }
}

pub fn customer(first: &str, last: &str) -> CustomerDetails {
    CustomerDetails {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}@example.com", first.to_lowercase()),
        phone: "555-0100".to_string(),
        address: "1 Main St".to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn sale(
    id: &str,
    vin: &str,
    salesperson_id: &str,
    dealership_id: &str,
    price_cents: i64,
    profit_cents: i64,
    commission_cents: i64,
    timestamp: DateTime<Utc>,
) -> Sale {
    Sale {
        id: id.to_string(),
        vehicle_id: vin.to_string(),
        salesperson_id: salesperson_id.to_string(),
        dealership_id: dealership_id.to_string(),
        customer: customer("Jane", "Doe"),
        sale_price_cents: price_cents,
        financing_income_cents: 0,
        insurance_income_cents: 0,
        profit_cents,
        commission_cents,
        timestamp,
    }
}

/// Three dealerships in three provinces, three identical June sales at
/// `d-1` (price 30000, financing 1000, insurance 500, cost 25000, 10%).
pub fn scenario_collections() -> SourceCollections {
    let dealerships = vec![
        dealership("d-1", "Maple Motors", "Toronto", "Ontario"),
        dealership("d-2", "Prairie Ford", "Calgary", "Alberta"),
        dealership("d-3", "Harbour Auto", "Halifax", "Nova Scotia"),
    ];

    let users = vec![
        user("sp-1", "Sam Seller", Role::Salesperson, Some("d-1")),
        user("sp-2", "Pat Prairie", Role::Salesperson, Some("d-2")),
        user("admin-1", "Ana Admin", Role::DealershipAdmin, Some("d-1")),
        user("admin-2", "Bo Admin", Role::DealershipAdmin, Some("d-2")),
        user("factory", "Fran Factory", Role::Factory, None),
    ];

    let vehicles = vec![
        vehicle("VIN0001", "Ranger", VehicleStatus::Sold, Some("d-1"), 2_500_000),
        vehicle("VIN0002", "Ranger", VehicleStatus::Sold, Some("d-1"), 2_500_000),
        vehicle("VIN0003", "Ranger", VehicleStatus::Sold, Some("d-1"), 2_500_000),
        vehicle("VIN0004", "Ranger", VehicleStatus::InStock, Some("d-1"), 2_500_000),
        vehicle("VIN0005", "Bronco", VehicleStatus::InStock, Some("d-2"), 3_800_000),
        vehicle("VIN0006", "Maverick", VehicleStatus::AtFactory, None, 2_200_000),
    ];

    let sales = ["VIN0001", "VIN0002", "VIN0003"]
        .iter()
        .enumerate()
        .map(|(i, vin)| {
            let mut s = sale(
                &format!("s-{}", i + 1),
                vin,
                "sp-1",
                "d-1",
                3_000_000,
                650_000,
                65_000,
                at(2024, 6, 1 + i as u32 * 4),
            );
            s.financing_income_cents = 100_000;
            s.insurance_income_cents = 50_000;
            s
        })
        .collect();

    SourceCollections {
        sales,
        vehicles,
        users,
        dealerships,
        goals: Vec::new(),
    }
}

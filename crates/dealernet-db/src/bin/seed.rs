//! # Seed Data Generator
//!
//! Populates an empty database with a demo dealership network.
//!
//! ## Usage
//! ```bash
//! # Seed ./dealernet_dev.db with 8 vehicles per dealership (default)
//! cargo run -p dealernet-db --bin seed
//!
//! # More stock per dealership
//! cargo run -p dealernet-db --bin seed -- --per-dealership 30
//!
//! # Specify database path
//! cargo run -p dealernet-db --bin seed -- --db ./data/dealernet.db
//! ```
//!
//! ## Generated Data
//! - Six dealerships across Argentina
//! - One factory user, one admin and two salespeople per dealership
//! - 20 vehicles at the factory
//! - Per dealership: vehicles in transit, arrived, and in stock
//!
//! Output is deterministic: VINs and ids derive from loop indexes, so two
//! runs against fresh databases produce identical data.

use chrono::{DateTime, Duration, Utc};
use std::env;

use dealernet_core::{
    Coords, Dealership, Role, User, Vehicle, VehicleHistoryEntry, VehicleStatus,
    DEFAULT_COMMISSION_RATE_BPS,
};
use dealernet_db::{Collection, Database, DbConfig};

/// (name, city, province, lat, lng)
const DEALERSHIPS: &[(&str, &str, &str, f64, f64)] = &[
    ("Auto del Sol", "Buenos Aires", "Buenos Aires", -34.6037, -58.3816),
    ("Córdoba Motors", "Córdoba", "Córdoba", -31.4201, -64.1888),
    ("Rosario Automotores", "Rosario", "Santa Fe", -32.9445, -60.6393),
    ("Norte Rodados", "Salta", "Salta", -24.7829, -65.4117),
    ("Cuyo Cars", "Mendoza", "Mendoza", -32.8895, -68.8458),
    ("Patagonia Sur", "Comodoro Rivadavia", "Chubut", -45.8641, -67.4969),
];

/// (model, colors, cost in whole dollars)
const MODELS: &[(&str, &[&str], i64)] = &[
    ("Ranger", &["Rojo Furia", "Plata Metalizado", "Azul Eléctrico"], 35_000),
    ("Maverick", &["Naranja Atardecer", "Gris Grafito", "Blanco Nieve"], 28_000),
    ("Bronco", &["Verde Oliva", "Negro Sombra", "Arena Desierto"], 42_000),
    ("Mustang Mach-E", &["Azul Impacto", "Rojo Racing", "Gris Magnético"], 50_000),
];

const FACTORY_VEHICLES: usize = 20;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut per_dealership: usize = 8;
    let mut db_path = String::from("./dealernet_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--per-dealership" | "-n" => {
                if i + 1 < args.len() {
                    per_dealership = args[i + 1].parse().unwrap_or(8);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("DealerNet Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --per-dealership <N>  Vehicles per dealership (default: 8)");
                println!("  -d, --db <PATH>           Database file path (default: ./dealernet_dev.db)");
                println!("  -h, --help                Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 DealerNet Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.documents().count(Collection::Dealerships).await?;
    if existing > 0 {
        println!("⚠ Database already has {} dealerships", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let dealerships = generate_dealerships();
    for dealership in &dealerships {
        db.dealerships().insert(dealership).await?;
    }
    println!("✓ {} dealerships", dealerships.len());

    let users = generate_users(&dealerships);
    for user in &users {
        db.users().insert(user).await?;
    }
    println!("✓ {} users", users.len());

    let vehicles = generate_vehicles(&dealerships, per_dealership);
    for vehicle in &vehicles {
        if let Err(e) = db.vehicles().insert(vehicle).await {
            eprintln!("Failed to insert {}: {}", vehicle.vin, e);
        }
    }
    println!("✓ {} vehicles", vehicles.len());

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn generate_dealerships() -> Vec<Dealership> {
    DEALERSHIPS
        .iter()
        .enumerate()
        .map(|(idx, (name, city, province, lat, lng))| Dealership {
            id: format!("dealership-{}", idx + 1),
            name: name.to_string(),
            city: city.to_string(),
            province: province.to_string(),
            coords: Coords { x: *lng, y: *lat },
        })
        .collect()
}

fn generate_users(dealerships: &[Dealership]) -> Vec<User> {
    let mut users = vec![User {
        id: "factory-admin".to_string(),
        username: "factory".to_string(),
        name: "Factory Operations".to_string(),
        role: Role::Factory,
        dealership_id: None,
        commission_rate_bps: None,
    }];

    for (idx, dealership) in dealerships.iter().enumerate() {
        let n = idx + 1;
        users.push(User {
            id: format!("admin-{}", n),
            username: format!("admin{}", n),
            name: format!("Admin {}", dealership.name),
            role: Role::DealershipAdmin,
            dealership_id: Some(dealership.id.clone()),
            commission_rate_bps: None,
        });
        for seller in 1..=2 {
            users.push(User {
                id: format!("seller-{}-{}", n, seller),
                username: format!("seller{}{}", n, seller),
                name: format!("Seller {} {}", seller, dealership.city),
                role: Role::Salesperson,
                dealership_id: Some(dealership.id.clone()),
                commission_rate_bps: Some(DEFAULT_COMMISSION_RATE_BPS),
            });
        }
    }
    users
}

/// Factory stock first, then per dealership a rotation of in-transit,
/// arrived, and in-stock vehicles.
fn generate_vehicles(dealerships: &[Dealership], per_dealership: usize) -> Vec<Vehicle> {
    let now = Utc::now();
    let mut vehicles = Vec::with_capacity(FACTORY_VEHICLES + dealerships.len() * per_dealership);
    let mut seq = 0usize;

    for _ in 0..FACTORY_VEHICLES {
        let built = now - Duration::days((seq % 40) as i64);
        vehicles.push(vehicle(seq, VehicleStatus::AtFactory, None, built));
        seq += 1;
    }

    for dealership in dealerships {
        for slot in 0..per_dealership {
            let status = match slot % 10 {
                0..=3 => VehicleStatus::InTransit,
                4..=6 => VehicleStatus::Arrived,
                _ => VehicleStatus::InStock,
            };
            let built = now - Duration::days(10 + (seq % 30) as i64);
            vehicles.push(vehicle(seq, status, Some(&dealership.id), built));
            seq += 1;
        }
    }
    vehicles
}

fn vehicle(
    seq: usize,
    status: VehicleStatus,
    dealership_id: Option<&str>,
    built: DateTime<Utc>,
) -> Vehicle {
    let (model, colors, cost) = MODELS[seq % MODELS.len()];

    let mut history = vec![VehicleHistoryEntry {
        status: VehicleStatus::AtFactory,
        date: built,
    }];
    let shipped = built + Duration::days(1);
    let arrived = shipped + Duration::days(1 + (seq % 8) as i64);
    let path: Vec<(VehicleStatus, DateTime<Utc>)> = match status {
        VehicleStatus::InTransit => vec![(VehicleStatus::InTransit, shipped)],
        VehicleStatus::Arrived => vec![
            (VehicleStatus::InTransit, shipped),
            (VehicleStatus::Arrived, arrived),
        ],
        VehicleStatus::InStock => vec![
            (VehicleStatus::InTransit, shipped),
            (VehicleStatus::Arrived, arrived),
            (VehicleStatus::InStock, arrived + Duration::hours(1)),
        ],
        _ => Vec::new(),
    };
    history.extend(
        path.into_iter()
            .map(|(status, date)| VehicleHistoryEntry { status, date }),
    );

    Vehicle {
        vin: format!("VDN{:014}", seq),
        model: model.to_string(),
        color: colors[seq % colors.len()].to_string(),
        year: 2024,
        cost_price_cents: cost * 100,
        status,
        dealership_id: dealership_id.map(str::to_string),
        history,
        estimated_arrival_date: None,
        current_location: None,
    }
}

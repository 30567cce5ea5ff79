//! # Seed Data Generator
//!
//! Populates the database with development data: a shelf of batteries,
//! a few open service jobs, and a pending buy-back credit.
//!
//! ## Usage
//! ```bash
//! cargo run -p volt-db --bin seed
//!
//! # Specify database path
//! cargo run -p volt-db --bin seed -- --db ./data/voltpos.db
//! ```

use chrono::Utc;
use std::env;
use uuid::Uuid;
use volt_core::{ExchangeRecord, ExchangeStatus, Product, ServiceJob, ServiceStatus};
use volt_db::{Database, DbConfig};

/// (brand, model, battery type, capacity, price in paise, stock, min stock)
const BATTERIES: &[(&str, &str, &str, &str, i64, i64, i64)] = &[
    ("Exide", "Mileage ML38B20L", "Car", "35Ah", 450000, 8, 3),
    ("Exide", "Matrix MT40B20R", "Car", "40Ah", 520000, 5, 2),
    ("Amaron", "GO 38B20L", "Car", "35Ah", 430000, 10, 3),
    ("Amaron", "PRO 55B24L", "Car", "45Ah", 610000, 4, 2),
    ("Exide", "Xplore XLTZ4", "Bike", "3Ah", 95000, 15, 5),
    ("Amaron", "PRO BIKE RIDER", "Bike", "5Ah", 120000, 12, 5),
    ("Luminous", "RC 18000", "Inverter", "150Ah", 1450000, 3, 1),
    ("Exide", "InvaMaster IMTT1500", "Inverter", "150Ah", 1580000, 2, 1),
    ("SF Sonic", "Flash Start FS1080", "Car", "35Ah", 410000, 6, 2),
    ("Luminous", "LPTT12150H", "Inverter", "150Ah", 1390000, 4, 2),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let db_path = parse_db_path().unwrap_or_else(|| "data/voltpos.db".to_string());

    println!("Seeding {db_path} ...");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let now = Utc::now();

    for (brand, model, battery_type, capacity_ah, price_paise, stock, min_stock) in BATTERIES {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            brand: brand.to_string(),
            model: model.to_string(),
            battery_type: battery_type.to_string(),
            capacity_ah: capacity_ah.to_string(),
            price_paise: *price_paise,
            stock: *stock,
            min_stock: *min_stock,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
    }
    println!("  {} products", BATTERIES.len());

    let service = ServiceJob {
        id: Uuid::new_v4().to_string(),
        customer_name: "Suresh Patil".to_string(),
        contact_number: "9812345678".to_string(),
        vehicle_details: "Hyundai i20 MH-12-XY-4455".to_string(),
        status: ServiceStatus::Pending,
        service_charge_paise: 30000,
        battery_brand: Some("Amaron".to_string()),
        battery_model: Some("GO 38B20L".to_string()),
        pickup_date: None,
        created_at: now,
        updated_at: now,
    };
    db.services().insert(&service).await?;
    println!("  1 service job");

    let credit = ExchangeRecord {
        id: Uuid::new_v4().to_string(),
        customer_name: "Meena Sharma".to_string(),
        customer_phone: Some("9898989898".to_string()),
        customer_address: None,
        battery_brand: "Exide".to_string(),
        battery_model: Some("ML38B20L".to_string()),
        valuation_paise: 60000,
        status: ExchangeStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    db.exchanges().insert(&credit).await?;
    println!("  1 pending exchange credit");

    println!("Done.");
    Ok(())
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}

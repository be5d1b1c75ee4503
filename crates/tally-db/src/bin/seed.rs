//! # Seed Data Generator
//!
//! Populates a database with an admin account, categories and demo products
//! for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally.db (or $TALLY_DB_PATH)
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//!
//! # More log output
//! RUST_LOG=debug cargo run -p tally-db --bin seed
//! ```
//!
//! ## Generated Data
//! - User `admin` / `admin123` with the admin role
//! - Five categories with a handful of products each
//! - Barcodes `590` + 10 digits, stock 0-50
//! - Default store settings

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;
use std::env;
use tally_core::{Category, Product, StoreSettings, User, UserRole};
use tally_db::repository::category::generate_category_id;
use tally_db::repository::product::generate_product_id;
use tally_db::repository::user::generate_user_id;
use tally_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const ADMIN_USERNAME: &str = "admin";
const ADMIN_PASSWORD: &str = "admin123";

/// Categories and their products as (name, price in cents).
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Beverages",
        &[
            ("Mineral Water 1.5L", 120),
            ("Orange Juice 1L", 349),
            ("Cola 330ml", 150),
            ("Green Tea 25 bags", 425),
            ("Ground Coffee 250g", 899),
        ],
    ),
    (
        "Snacks",
        &[
            ("Salted Crisps", 199),
            ("Chocolate Bar", 129),
            ("Mixed Nuts 200g", 599),
            ("Oat Cookies", 275),
        ],
    ),
    (
        "Household",
        &[
            ("Dish Soap", 329),
            ("Laundry Detergent 2kg", 1_299),
            ("Paper Towels 4-Pack", 649),
            ("Trash Bags 30ct", 499),
        ],
    ),
    (
        "Appliances",
        &[
            ("Electric Kettle", 3_499),
            ("Steam Iron", 4_250),
            ("Blender", 8_999),
            ("Microwave Oven", 18_900),
            ("Washing Machine", 64_900),
        ],
    ),
    (
        "Stationery",
        &[
            ("Ballpoint Pens 10ct", 249),
            ("A4 Paper Ream", 699),
            ("Stapler", 575),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = DbConfig::from_env();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config = DbConfig::new(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $TALLY_DB_PATH or ./tally.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding database");

    let db = Database::new(config).await?;

    seed_admin(&db).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(
            existing,
            "Database already has products, skipping catalog seed. Delete the file to regenerate."
        );
        db.close().await;
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0usize;

    for (category_name, products) in CATALOG {
        let category = db
            .categories()
            .insert(&Category {
                id: generate_category_id(),
                name: category_name.to_string(),
                description: None,
            })
            .await?;

        for (name, price_cents) in products.iter() {
            let product = demo_product(name, *price_cents, &category.id, generated);
            db.products().insert(&product).await?;
            generated += 1;
        }
    }

    db.settings()
        .save_store_settings(&StoreSettings::default())
        .await?;

    info!(
        categories = CATALOG.len(),
        products = generated,
        elapsed = ?start.elapsed(),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

/// Creates the admin account unless any user exists.
async fn seed_admin(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    if db.users().count().await? > 0 {
        info!("Users already present, skipping admin account");
        return Ok(());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(ADMIN_PASSWORD.as_bytes(), &salt)
        .map_err(|e| format!("Failed to hash admin password: {}", e))?
        .to_string();

    db.users()
        .insert(&User {
            id: generate_user_id(),
            username: ADMIN_USERNAME.to_string(),
            password_hash,
            role: UserRole::Admin,
            created_at: Utc::now(),
        })
        .await?;

    warn!(
        username = ADMIN_USERNAME,
        "Created admin account with the default password; change it before real use"
    );
    Ok(())
}

fn demo_product(name: &str, price_cents: i64, category_id: &str, seed: usize) -> Product {
    let now = Utc::now();

    Product {
        id: generate_product_id(),
        name: name.to_string(),
        price_cents,
        // Every seventh product starts out of stock
        stock: if seed % 7 == 6 { 0 } else { ((seed * 13) % 50 + 1) as i64 },
        category_id: Some(category_id.to_string()),
        // EAN-13 shaped, checksum not valid
        barcode: Some(format!("590{:010}", seed + 1)),
        created_at: now,
        updated_at: now,
    }
}

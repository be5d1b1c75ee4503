//! Shared fixtures for ledger integration tests.
//!
//! Every test gets its own in-memory database with migrations applied and
//! one cashier account.

#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use tally_core::{ActingUser, Customer, InstallmentTerms, PaymentMethod, Product, User, UserRole};
use tally_db::repository::user::generate_user_id;
use tally_db::{Database, DbConfig};
use tally_ledger::{CheckoutReceipt, Ledger, NewProduct};

pub struct Fixture {
    pub ledger: Ledger,
    pub cashier: ActingUser,
}

impl Fixture {
    pub fn db(&self) -> &Database {
        self.ledger.database()
    }

    pub async fn product(&self, name: &str, price_cents: i64, stock: i64) -> Product {
        self.ledger
            .catalog()
            .create_product(&NewProduct {
                name: name.to_string(),
                price_cents,
                stock,
                ..NewProduct::default()
            })
            .await
            .unwrap()
    }

    pub async fn stock_of(&self, product_id: &str) -> i64 {
        self.ledger.catalog().product(product_id).await.unwrap().stock
    }

    pub async fn customer(&self, name: &str) -> Customer {
        self.ledger
            .catalog()
            .create_customer(&tally_core::ContactInfo {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    /// Cash checkout of `qty` units of one product, paid in full.
    pub async fn sell(&self, product: &Product, qty: i64) -> CheckoutReceipt {
        let mut cart = tally_core::Cart::new();
        cart.add_product(product, qty).unwrap();

        self.ledger
            .sales()
            .checkout(
                &cart,
                None,
                &self.cashier,
                PaymentMethod::Cash,
                InstallmentTerms::paid_in_full(),
                date(2024, 1, 15),
            )
            .await
            .unwrap()
    }
}

pub async fn setup() -> Fixture {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();

    // Password hashing is exercised by the auth tests; a placeholder keeps
    // the other fixtures fast.
    let user = User {
        id: generate_user_id(),
        username: "cashier".to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        role: UserRole::Cashier,
        created_at: Utc::now(),
    };
    db.users().insert(&user).await.unwrap();

    Fixture {
        ledger: Ledger::new(db),
        cashier: ActingUser::from(&user),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

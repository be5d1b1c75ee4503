//! # Schema Migrations
//!
//! The SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied by [`Database::new`](crate::Database::new) when
//! `DbConfig::run_migrations` is set.
//!
//! ```text
//! 001_initial_schema.sql
//!   users ─┐
//!          ├─► invoices ─┬─► invoice_items ──► products ──► categories
//!   customers ┘          ├─► installment_payments
//!                        └─► returns
//!   suppliers, expenses, settings (standalone)
//! ```
//!
//! Applied files are recorded in `_sqlx_migrations`. Shipped files are never
//! edited; schema changes go in a new `NNN_description.sql`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Tables the ledger expects after migrating.
pub const LEDGER_TABLES: &[&str] = &[
    "users",
    "categories",
    "products",
    "customers",
    "suppliers",
    "invoices",
    "invoice_items",
    "installment_payments",
    "returns",
    "expenses",
    "settings",
];

/// Applies pending migrations. Safe to call on an up-to-date database.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (total, applied) = migration_status(pool).await?;
    debug!(total, applied, "Migration status before run");

    MIGRATOR.run(pool).await?;

    info!(pending = total.saturating_sub(applied), "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // No bookkeeping table before the first run
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

/// Ledger tables absent from the connected database.
pub async fn missing_tables(pool: &SqlitePool) -> DbResult<Vec<&'static str>> {
    let present: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await?;

    Ok(LEDGER_TABLES
        .iter()
        .copied()
        .filter(|table| !present.iter().any(|p| p == table))
        .collect())
}
